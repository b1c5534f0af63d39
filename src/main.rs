// main.rs

// --- External Crate Imports ---
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use assay_stats::format::{self, FormatOptions};
use assay_stats::parse::BlockLayout;
use assay_stats::plot;
use assay_stats::workbook::{self, SheetKind, Workbook};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Assay worksheet formatter and percent-change statistics tool.", long_about = None, propagate_version = true)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value = "Info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a raw sheet and produce its "- FORMATTED" and "- FINAL" sheets.
    Format {
        /// Directory holding the workbook's .tsv sheets.
        #[arg(short = 'w', long = "workbook", required = true)]
        workbook: PathBuf,

        /// Name of the raw source sheet.
        #[arg(short, long, required = true)]
        sheet: String,

        /// Number of experiment blocks recorded in the source sheet.
        #[arg(short, long, required = true)]
        experiments: usize,

        /// Variables per sample in the source block layout.
        #[arg(long, default_value_t = 19)]
        block_variables: usize,
    },

    /// Extract selected variables from a "- FINAL" sheet into a "- PLOT" table.
    Plot {
        /// Directory holding the workbook's .tsv sheets.
        #[arg(short = 'w', long = "workbook", required = true)]
        workbook: PathBuf,

        /// Name of the "- FINAL" sheet to plot from.
        #[arg(short, long, required = true)]
        sheet: String,

        /// Variables to plot.
        #[arg(short, long, required = true, value_delimiter = ',')]
        variables: Vec<String>,

        /// Include SEM error-bar columns.
        #[arg(long)]
        sem: bool,
    },

    /// List the sheets in a workbook.
    Sheets {
        /// Directory holding the workbook's .tsv sheets.
        #[arg(short = 'w', long = "workbook", required = true)]
        workbook: PathBuf,

        /// Restrict the listing to one kind of sheet.
        #[arg(long, value_enum)]
        kind: Option<KindFilter>,
    },
}

/// The two listings the selection dialogs need: raw sheets for formatting,
/// "- FINAL" sheets for plotting.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindFilter {
    Raw,
    Final,
}

// --- Main Function ---

fn main() -> Result<()> {
    let total_time_start = Instant::now();
    let cli_args = CliArgs::parse();

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    match cli_args.command {
        Command::Format {
            workbook,
            sheet,
            experiments,
            block_variables,
        } => run_format(&workbook, &sheet, experiments, block_variables)?,
        Command::Plot {
            workbook,
            sheet,
            variables,
            sem,
        } => run_plot(&workbook, &sheet, variables, sem)?,
        Command::Sheets { workbook, kind } => run_sheets(&workbook, kind)?,
    }

    info!(
        "assay_stats finished successfully in {:.2?}.",
        total_time_start.elapsed()
    );
    Ok(())
}

// --- Subcommand Implementations ---

fn run_format(dir: &Path, sheet: &str, experiments: usize, block_variables: usize) -> Result<()> {
    if experiments == 0 {
        bail!("Value for 'number of experiments' is invalid: must be at least 1.");
    }
    if block_variables == 0 {
        bail!("Value for 'block variables' is invalid: must be at least 1.");
    }
    if workbook::classify(sheet) != SheetKind::Raw {
        warn!(
            "'{}' looks like a generated sheet; formatting it anyway.",
            sheet
        );
    }

    let wb = Workbook::open(dir)?;

    // --- 1. Load the raw source sheet ---
    info!("Loading source sheet '{}'...", sheet);
    let source = wb.load_sheet(sheet)?;

    // --- 2. Parse, reshape, and compute statistics ---
    let opts = FormatOptions {
        num_experiments: experiments,
        block_layout: BlockLayout::with_variables(block_variables),
    };
    let output = format::run(&source, &opts)
        .map_err(|e| anyhow!("Failed to format sheet '{}': {}", sheet, e))?;
    info!(
        "Formatted {} variable(s) across {} sample name(s).",
        output.variable_names.len(),
        output.sample_names.len()
    );

    // --- 3. Write both artifact sheets (delete-and-recreate on collision) ---
    wb.store_sheet(&workbook::formatted_name(sheet), &output.formatted)?;
    wb.store_sheet(&workbook::final_name(sheet), &output.summary)?;
    Ok(())
}

fn run_plot(dir: &Path, sheet: &str, variables: Vec<String>, sem: bool) -> Result<()> {
    if variables.is_empty() {
        bail!("No variables selected. Please select at least 1 variable.");
    }
    if workbook::classify(sheet) != SheetKind::Final {
        warn!("'{}' does not look like a '- FINAL' sheet.", sheet);
    }

    let wb = Workbook::open(dir)?;

    // --- 1. Load the condensed sheet ---
    info!("Loading condensed sheet '{}'...", sheet);
    let summary = wb.load_sheet(sheet)?;

    // --- 2. Extract the selected series ---
    let series = plot::extract(&summary, &variables);
    if series.is_empty() {
        bail!(
            "None of the selected variables ({:?}) were found in sheet '{}'.",
            variables,
            sheet
        );
    }
    info!(
        "Extracted {} series ({} requested); SEM error bars: {}.",
        series.len(),
        variables.len(),
        sem
    );

    // --- 3. Write the plot table ---
    let trimmed = workbook::trimmed_name(sheet);
    let table = plot::plot_table(&series, trimmed, sem);
    wb.store_sheet(&workbook::plot_name(sheet), &table)?;
    Ok(())
}

fn run_sheets(dir: &Path, kind: Option<KindFilter>) -> Result<()> {
    let wb = Workbook::open(dir)?;
    for name in wb.sheet_names()? {
        let keep = match kind {
            None => true,
            Some(KindFilter::Raw) => workbook::classify(&name) == SheetKind::Raw,
            Some(KindFilter::Final) => workbook::classify(&name) == SheetKind::Final,
        };
        if keep {
            println!("{}", name);
        }
    }
    Ok(())
}
