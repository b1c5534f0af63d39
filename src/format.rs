// format.rs

use log::{debug, info};

use crate::grid::{Cell, SparseGrid, NON_FINITE_SENTINEL};
use crate::layout::VerboseLayout;
use crate::parse::{self, BlockLayout, Dataset, ParseError};
use crate::stats::{self, StatRecord, StatValue};

const DATA_START_ROW: usize = 2;
const DATA_START_COL: usize = 2;

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub num_experiments: usize,
    pub block_layout: BlockLayout,
}

/// Everything one format operation produces: the verbose breakdown, the
/// condensed summary, and the registries that drove their headers.
#[derive(Debug)]
pub struct FormatOutput {
    pub formatted: SparseGrid,
    pub summary: SparseGrid,
    pub variable_names: Vec<String>,
    pub sample_names: Vec<String>,
    pub records: Vec<StatRecord>,
}

/// Runs the full pipeline over a raw source grid: parse the experiment
/// blocks, write the verbose grid, compute percent-change statistics in
/// place, then condense means and SEMs into the summary grid.
pub fn run(source: &SparseGrid, opts: &FormatOptions) -> Result<FormatOutput, ParseError> {
    info!(
        "parsing source grid ({} experiment(s), block height {})",
        opts.num_experiments,
        opts.block_layout.block_height()
    );
    let dataset = parse::parse(source, opts.num_experiments, &opts.block_layout)?;
    let num_variables = dataset.num_variables();

    let layout = VerboseLayout::new(opts.num_experiments);
    info!(
        "writing verbose grid: {} sample position(s) x {} variable(s)",
        dataset.num_samples, num_variables
    );
    let (mut formatted, variable_names, sample_names) = write_verbose(&dataset, &layout);

    info!("computing percent-change statistics");
    let records = stats::calculate(&mut formatted, &layout, num_variables, dataset.num_samples);

    info!(
        "condensing {} stat record(s) into the summary grid",
        records.len()
    );
    let summary = write_summary(
        &records,
        &variable_names,
        &sample_names,
        opts.num_experiments,
    );

    Ok(FormatOutput {
        formatted,
        summary,
        variable_names,
        sample_names,
        records,
    })
}

/// Writes the `"<sample> : <variable>"` labels and raw values. Columns band
/// by sample position, and within a band rows go experiment-first with
/// variables stacked at the layout stride. Sample and variable names are
/// registered in first-seen order; those registries later become the summary
/// grid's headers.
fn write_verbose(
    dataset: &Dataset,
    layout: &VerboseLayout,
) -> (SparseGrid, Vec<String>, Vec<String>) {
    let mut grid = SparseGrid::new();
    let mut variable_names: Vec<String> = Vec::new();
    let mut sample_names: Vec<String> = Vec::new();

    for position in 0..dataset.num_samples {
        for (exp_idx, experiment) in dataset.experiments.iter().enumerate() {
            // Shorter experiments have no sample at this slot; its rows stay
            // empty and the engine's presence check reduces n accordingly.
            let Some(sample) = experiment.samples.get(position) else {
                debug!(
                    "experiment {} has no sample at position {}",
                    exp_idx + 1,
                    position
                );
                continue;
            };

            if !sample_names.contains(&sample.name) {
                sample_names.push(sample.name.clone());
            }

            for (k, (variable, value)) in sample.variables.iter().enumerate() {
                if !variable_names.contains(variable) {
                    variable_names.push(variable.clone());
                }
                let row = layout.value_row(k, exp_idx + 1);
                grid.set(
                    row,
                    layout.label_col(position),
                    Cell::text(format!("{} : {}", sample.name, variable)),
                );
                grid.set(row, layout.value_col(position), Cell::Number(*value));
            }
        }
    }

    (grid, variable_names, sample_names)
}

/// Condenses the stat records: one row per variable, one (mean, SEM) column
/// pair per non-control sample. Non-finite statistics are rendered as the
/// flagged sentinel so downstream consumers can detect them.
fn write_summary(
    records: &[StatRecord],
    variable_names: &[String],
    sample_names: &[String],
    num_experiments: usize,
) -> SparseGrid {
    let mut grid = SparseGrid::new();

    for record in records {
        let row = DATA_START_ROW + record.variable;
        let col = DATA_START_COL + 2 * (record.sample - 1);
        grid.set(row, col, summary_cell(&record.summary.mean));
        grid.set(row, col + 1, summary_cell(&record.summary.sem));
    }

    for (i, name) in variable_names.iter().enumerate() {
        grid.set(DATA_START_ROW + i, 1, Cell::text(name.clone()));
    }

    // Control samples fill the first num_experiments registry slots; the
    // summary carries treatments only.
    for (t, name) in sample_names.iter().skip(num_experiments).enumerate() {
        grid.set(1, DATA_START_COL + 2 * t, Cell::text(name.clone()));
        grid.set(1, DATA_START_COL + 2 * t + 1, Cell::text("SEM"));
    }

    grid
}

fn summary_cell(value: &StatValue) -> Cell {
    match value {
        StatValue::Finite(v) => Cell::Number(*v),
        StatValue::NonFinite(_) => Cell::Flagged(NON_FINITE_SENTINEL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_sample(
        grid: &mut SparseGrid,
        top: usize,
        col: usize,
        name: &str,
        values: &[(&str, f64)],
    ) {
        grid.set(top, col, Cell::text(name));
        grid.set(top, col + 1, Cell::text("Transient #1"));
        for (k, (var, val)) in values.iter().enumerate() {
            grid.set(top + 1 + k, col, Cell::text(*var));
            grid.set(top + 1 + k, col + 1, Cell::Number(*val));
        }
    }

    fn opts(num_experiments: usize) -> FormatOptions {
        FormatOptions {
            num_experiments,
            block_layout: BlockLayout::with_variables(3),
        }
    }

    /// Two experiments, control + one treatment, one variable:
    /// controls [10, 20], treatments [15, 25] -> changes [50, 25].
    fn two_experiment_source() -> SparseGrid {
        let mut grid = SparseGrid::new();
        put_sample(&mut grid, 1, 1, "Ctrl 1", &[("X", 10.0)]);
        put_sample(&mut grid, 1, 4, "drug", &[("X", 15.0)]);
        put_sample(&mut grid, 7, 1, "Ctrl 2", &[("X", 20.0)]);
        put_sample(&mut grid, 7, 4, "drug", &[("X", 25.0)]);
        grid
    }

    #[test]
    fn verbose_grid_places_labels_and_values() {
        let out = run(&two_experiment_source(), &opts(2)).unwrap();
        assert_eq!(
            out.formatted.text_at(1, 1).as_deref(),
            Some("Ctrl 1 : X")
        );
        assert_eq!(out.formatted.number_at(1, 2), Some(10.0));
        assert_eq!(out.formatted.text_at(2, 4).as_deref(), Some("drug : X"));
        assert_eq!(out.formatted.number_at(2, 5), Some(25.0));
        // percent-change column
        assert_eq!(out.formatted.number_at(1, 6), Some(50.0));
        assert_eq!(out.formatted.number_at(2, 6), Some(25.0));
    }

    #[test]
    fn summary_grid_has_headers_and_stats() {
        let out = run(&two_experiment_source(), &opts(2)).unwrap();
        // registries: controls first (one per experiment), then the treatment
        assert_eq!(out.sample_names, ["Ctrl 1", "Ctrl 2", "drug"]);
        assert_eq!(out.variable_names, ["X"]);

        assert_eq!(out.summary.text_at(2, 1).as_deref(), Some("X"));
        assert_eq!(out.summary.text_at(1, 2).as_deref(), Some("drug"));
        assert_eq!(out.summary.text_at(1, 3).as_deref(), Some("SEM"));
        assert_eq!(out.summary.number_at(2, 2), Some(37.5));
        assert_eq!(out.summary.number_at(2, 3), Some(12.5));
    }

    #[test]
    fn non_finite_stats_become_flagged_sentinels() {
        let mut grid = SparseGrid::new();
        put_sample(&mut grid, 1, 1, "Ctrl", &[("X", 0.0)]);
        put_sample(&mut grid, 1, 4, "drug", &[("X", 15.0)]);
        let out = run(&grid, &opts(1)).unwrap();

        let mean = out.summary.get(2, 2).unwrap();
        let sem = out.summary.get(2, 3).unwrap();
        assert!(mean.is_flagged());
        assert!(sem.is_flagged());
        assert_eq!(mean.as_number(), Some(NON_FINITE_SENTINEL));
    }

    #[test]
    fn format_is_idempotent_by_overwrite() {
        let source = two_experiment_source();
        let first = run(&source, &opts(2)).unwrap();
        let second = run(&source, &opts(2)).unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.formatted, second.formatted);
    }

    #[test]
    fn shorter_experiment_skips_its_slot() {
        let mut grid = SparseGrid::new();
        put_sample(&mut grid, 1, 1, "Ctrl 1", &[("X", 10.0)]);
        put_sample(&mut grid, 1, 4, "drug", &[("X", 15.0)]);
        // experiment 2 recorded only its control
        put_sample(&mut grid, 7, 1, "Ctrl 2", &[("X", 20.0)]);

        let out = run(&grid, &opts(2)).unwrap();
        let record = &out.records[0];
        assert_eq!((record.variable, record.sample), (0, 1));
        assert_eq!(record.summary.n, 1);
        assert_eq!(record.summary.mean.finite(), Some(50.0));
    }
}
