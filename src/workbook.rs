// workbook.rs

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::grid::SparseGrid;

pub const FORMATTED_SUFFIX: &str = " - FORMATTED";
pub const FINAL_SUFFIX: &str = " - FINAL";
pub const PLOT_SUFFIX: &str = " - PLOT";

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("workbook directory {0} does not exist or is not a directory")]
    NotADirectory(PathBuf),
    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Verbose artifact name for a source sheet.
pub fn formatted_name(source: &str) -> String {
    format!("{}{}", source, FORMATTED_SUFFIX)
}

/// Condensed artifact name for a source sheet.
pub fn final_name(source: &str) -> String {
    format!("{}{}", source, FINAL_SUFFIX)
}

/// Plot artifact name for a condensed sheet: its base name trimmed at the
/// first space. A name with no space is used whole.
pub fn plot_name(final_sheet: &str) -> String {
    format!("{}{}", trimmed_name(final_sheet), PLOT_SUFFIX)
}

pub fn trimmed_name(name: &str) -> &str {
    match name.find(' ') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// What role a sheet plays, judged from its name the way the original host
/// forms did: artifacts carry their marker as a substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Raw,
    Formatted,
    Final,
    Plot,
}

pub fn classify(name: &str) -> SheetKind {
    if name.contains("FORMATTED") {
        SheetKind::Formatted
    } else if name.contains("FINAL") {
        SheetKind::Final
    } else if name.contains("PLOT") {
        SheetKind::Plot
    } else {
        SheetKind::Raw
    }
}

/// A workbook backed by a directory of `.tsv` sheets, one file per sheet,
/// file stem = sheet name.
#[derive(Debug)]
pub struct Workbook {
    dir: PathBuf,
}

impl Workbook {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, WorkbookError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(WorkbookError::NotADirectory(dir));
        }
        Ok(Self { dir })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.tsv", name))
    }

    /// All sheet names in the workbook, sorted.
    pub fn sheet_names(&self) -> Result<Vec<String>, WorkbookError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "tsv") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load_sheet(&self, name: &str) -> Result<SparseGrid, WorkbookError> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(WorkbookError::MissingSheet(name.to_string()));
        }
        debug!("loading sheet '{}' from {}", name, path.display());
        let text = fs::read_to_string(path)?;
        Ok(SparseGrid::from_tsv(&text))
    }

    /// Writes an artifact sheet, first deleting every existing sheet whose
    /// name contains the artifact name (last-write-wins, no versioning).
    pub fn store_sheet(&self, name: &str, grid: &SparseGrid) -> Result<(), WorkbookError> {
        for existing in self.sheet_names()? {
            if existing.contains(name) {
                info!("replacing existing sheet '{}'", existing);
                fs::remove_file(self.sheet_path(&existing))?;
            }
        }
        let path = self.sheet_path(name);
        info!("writing sheet '{}' to {}", name, path.display());
        fs::write(path, grid.to_tsv())?;
        Ok(())
    }
}
