// parse.rs

use log::{debug, warn};
use thiserror::Error;

use crate::grid::{Cell, SparseGrid};

/// Structural failures while walking the raw grid. These abort the whole
/// operation; statistical edge cases are handled downstream as tagged values.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("cell ({row}, {col}) holds '{value}', which is neither numeric nor the literal 'Error'")]
    MalformedValue {
        row: usize,
        col: usize,
        value: String,
    },
    #[error("cell ({row}, {col}) should hold a variable name but is empty while the value column beside it is not")]
    MissingVariableName { row: usize, col: usize },
    #[error("experiment 1 has no data at the top of its block (row {row}, column 1)")]
    EmptyExperiment { row: usize },
}

/// Block geometry of the raw worksheet. The source encodes experiments as
/// consecutive fixed-height blocks; the per-sample variable count is a layout
/// convention of the recording software, not derivable from any one sheet, so
/// it is carried here as configuration rather than a literal.
#[derive(Debug, Clone, Copy)]
pub struct BlockLayout {
    pub header_rows: usize,
    pub variables_per_sample: usize,
    pub spacer_rows: usize,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            variables_per_sample: 19,
            spacer_rows: 2,
        }
    }
}

impl BlockLayout {
    pub fn with_variables(variables_per_sample: usize) -> Self {
        Self {
            variables_per_sample,
            ..Self::default()
        }
    }

    pub fn block_height(&self) -> usize {
        self.header_rows + self.variables_per_sample + self.spacer_rows
    }

    /// Top row of the block for a 1-based experiment index.
    pub fn top_row(&self, experiment: usize) -> usize {
        (experiment - 1) * self.block_height() + 1
    }
}

/// One sample: its name plus (variable, value) pairs in source row order.
/// Variable names are kept as an ordered sequence rather than a map so the
/// verbose grid reproduces the source ordering exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub variables: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiment {
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub experiments: Vec<Experiment>,
    /// Max sample count observed in any single experiment.
    pub num_samples: usize,
}

impl Dataset {
    /// Max variable count observed in any single sample across the dataset.
    pub fn num_variables(&self) -> usize {
        self.experiments
            .iter()
            .flat_map(|e| e.samples.iter())
            .map(|s| s.variables.len())
            .max()
            .unwrap_or(0)
    }

    /// Sample at a given position of a given experiment, when that experiment
    /// is long enough. Shorter experiments simply have no sample at that slot.
    pub fn sample_at(&self, experiment: usize, position: usize) -> Option<&Sample> {
        self.experiments.get(experiment)?.samples.get(position)
    }
}

/// Walks the raw grid and recovers experiments -> samples -> (variable, value).
///
/// Within a block, samples occupy consecutive 3-column groups: variable names
/// down the first column, values down the second, the third is padding. The
/// block's first row carries the sample name (its value cell is a per-sample
/// header and is skipped). A sample ends at the first empty value cell; an
/// experiment ends when column 1 of its top row is empty.
pub fn parse(
    grid: &SparseGrid,
    num_experiments: usize,
    layout: &BlockLayout,
) -> Result<Dataset, ParseError> {
    let mut dataset = Dataset::default();

    for exp in 1..=num_experiments {
        let top = layout.top_row(exp);
        let mut experiment = Experiment::default();
        let mut col = 1;

        while grid.get(top, col).is_some() {
            experiment.samples.push(parse_sample(grid, top, col)?);
            col += 3;
        }

        if exp == 1 && experiment.samples.is_empty() {
            return Err(ParseError::EmptyExperiment { row: top });
        }
        if experiment.samples.is_empty() {
            debug!("experiment {} block (top row {}) is empty", exp, top);
        }

        dataset.num_samples = dataset.num_samples.max(experiment.samples.len());
        dataset.experiments.push(experiment);
    }

    debug!(
        "parsed {} experiment(s), {} sample position(s), {} variable(s)",
        dataset.experiments.len(),
        dataset.num_samples,
        dataset.num_variables()
    );
    Ok(dataset)
}

fn parse_sample(grid: &SparseGrid, top: usize, col: usize) -> Result<Sample, ParseError> {
    let mut sample = Sample {
        name: String::new(),
        variables: Vec::new(),
    };

    let mut row = top;
    while let Some(value_cell) = grid.get(row, col + 1) {
        if row == top {
            // First row of the group: sample name beside a header cell.
            match grid.get(row, col) {
                Some(cell) => sample.name = cell.to_string(),
                None => return Err(ParseError::MissingVariableName { row, col }),
            }
        } else {
            let name = match grid.get(row, col) {
                Some(cell) => cell.to_string(),
                None => return Err(ParseError::MissingVariableName { row, col }),
            };
            sample
                .variables
                .push((name, cell_value(value_cell, row, col + 1)?));
        }
        row += 1;
    }

    if sample.name.is_empty() {
        warn!(
            "sample group at ({}, {}) has a name cell but no header value; recording it as empty",
            top, col
        );
        if let Some(cell) = grid.get(top, col) {
            sample.name = cell.to_string();
        }
    }

    Ok(sample)
}

/// Numeric reading of a value cell. The recording software emits the literal
/// string "Error" for failed measurements; those are taken as 0.0.
fn cell_value(cell: &Cell, row: usize, col: usize) -> Result<f64, ParseError> {
    match cell {
        Cell::Number(v) | Cell::Flagged(v) => Ok(*v),
        Cell::Text(s) if s == "Error" => Ok(0.0),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseError::MalformedValue {
                row,
                col,
                value: s.clone(),
            }),
    }
}
