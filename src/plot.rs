// plot.rs

use log::{debug, warn};

use crate::grid::{Cell, SparseGrid};

/// One summary statistic pulled back out of the condensed grid, with the
/// non-finite flag preserved so chart consumers can treat sentinels specially.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotValue {
    pub value: f64,
    pub flagged: bool,
}

impl PlotValue {
    fn from_cell(cell: &Cell) -> Option<Self> {
        cell.as_number().map(|value| PlotValue {
            value,
            flagged: cell.is_flagged(),
        })
    }
}

/// Per-variable chart input: aligned sample names, means and SEMs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub variable: String,
    pub sample_names: Vec<String>,
    pub means: Vec<PlotValue>,
    pub sems: Vec<PlotValue>,
}

/// Re-parses a condensed ("- FINAL") grid for the selected variables.
///
/// Row 1 holds (sample, "SEM") header pairs at stride 2; column 1 holds the
/// variable names from row 2 down. Variables that are not selected, or not
/// present, contribute no series.
pub fn extract(grid: &SparseGrid, selected: &[String]) -> Vec<PlotSeries> {
    let mut all = Vec::new();

    for row in 2..=grid.row_count() {
        let Some(variable) = grid.text_at(row, 1) else {
            continue;
        };
        if !selected.contains(&variable) {
            continue;
        }

        let mut series = PlotSeries {
            variable,
            sample_names: Vec::new(),
            means: Vec::new(),
            sems: Vec::new(),
        };
        let mut col = 2;
        while col < grid.col_count() {
            let Some(sample) = grid.text_at(1, col) else {
                break;
            };
            let mean = grid.get(row, col).and_then(PlotValue::from_cell);
            let sem = grid.get(row, col + 1).and_then(PlotValue::from_cell);
            match (mean, sem) {
                (Some(mean), Some(sem)) => {
                    series.sample_names.push(sample);
                    series.means.push(mean);
                    series.sems.push(sem);
                }
                _ => warn!(
                    "summary row {} is missing a mean/SEM pair under sample '{}'",
                    row, sample
                ),
            }
            col += 2;
        }

        debug!(
            "extracted series for '{}' with {} sample(s)",
            series.variable,
            series.sample_names.len()
        );
        all.push(series);
    }

    all
}

/// Lays the extracted series out as the "- PLOT" data table: samples down
/// column 1, one mean column per series (named "<trimmed> - <variable>" as
/// chart series are), an adjacent SEM column per series when error bars are
/// requested. The chart renderer itself is an external concern.
pub fn plot_table(series: &[PlotSeries], trimmed_name: &str, include_sem: bool) -> SparseGrid {
    let mut grid = SparseGrid::new();
    let Some(first) = series.first() else {
        return grid;
    };

    grid.set(1, 1, Cell::text("Sample"));
    for (row, sample) in first.sample_names.iter().enumerate() {
        grid.set(2 + row, 1, Cell::text(sample.clone()));
    }

    let width = if include_sem { 2 } else { 1 };
    let mut col = 2;
    for one in series {
        // Rows are keyed by the shared sample column; a series whose samples
        // differ (a dropped mean/SEM pair in the source sheet) would misalign
        // against those labels, so it is left out.
        if one.sample_names != first.sample_names {
            warn!(
                "series '{}' covers different samples than '{}'; leaving it out of the table",
                one.variable, first.variable
            );
            continue;
        }
        grid.set(
            1,
            col,
            Cell::text(format!("{} - {}", trimmed_name, one.variable)),
        );
        if include_sem {
            grid.set(1, col + 1, Cell::text("SEM"));
        }
        for (row, mean) in one.means.iter().enumerate() {
            grid.set(2 + row, col, value_cell(mean));
            if include_sem {
                grid.set(2 + row, col + 1, value_cell(&one.sems[row]));
            }
        }
        col += width;
    }

    grid
}

fn value_cell(value: &PlotValue) -> Cell {
    if value.flagged {
        Cell::Flagged(value.value)
    } else {
        Cell::Number(value.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Condensed grid with variables X, Y and treatments "drug A", "drug B".
    fn summary_grid() -> SparseGrid {
        let mut grid = SparseGrid::new();
        grid.set(1, 2, Cell::text("drug A"));
        grid.set(1, 3, Cell::text("SEM"));
        grid.set(1, 4, Cell::text("drug B"));
        grid.set(1, 5, Cell::text("SEM"));
        grid.set(2, 1, Cell::text("X"));
        grid.set(3, 1, Cell::text("Y"));
        for (row, base) in [(2, 10.0), (3, 20.0)] {
            grid.set(row, 2, Cell::Number(base));
            grid.set(row, 3, Cell::Number(1.0));
            grid.set(row, 4, Cell::Number(base * 2.0));
            grid.set(row, 5, Cell::Number(2.0));
        }
        grid
    }

    #[test]
    fn extracts_only_selected_variables() {
        let series = extract(&summary_grid(), &["Y".to_string()]);
        assert_eq!(series.len(), 1);
        let s = &series[0];
        assert_eq!(s.variable, "Y");
        assert_eq!(s.sample_names, ["drug A", "drug B"]);
        assert_eq!(s.means[0].value, 20.0);
        assert_eq!(s.sems[1].value, 2.0);
    }

    #[test]
    fn unknown_variables_emit_nothing() {
        let series = extract(&summary_grid(), &["Z".to_string()]);
        assert!(series.is_empty());
    }

    #[test]
    fn flagged_sentinels_survive_extraction() {
        let mut grid = summary_grid();
        grid.set(2, 2, Cell::Flagged(0.001));
        let series = extract(&grid, &["X".to_string()]);
        assert!(series[0].means[0].flagged);
        assert_eq!(series[0].means[0].value, 0.001);
    }

    #[test]
    fn plot_table_with_error_bars() {
        let series = extract(&summary_grid(), &["X".to_string(), "Y".to_string()]);
        let table = plot_table(&series, "Trial7", true);

        assert_eq!(table.text_at(1, 1).as_deref(), Some("Sample"));
        assert_eq!(table.text_at(1, 2).as_deref(), Some("Trial7 - X"));
        assert_eq!(table.text_at(1, 3).as_deref(), Some("SEM"));
        assert_eq!(table.text_at(1, 4).as_deref(), Some("Trial7 - Y"));
        assert_eq!(table.text_at(2, 1).as_deref(), Some("drug A"));
        assert_eq!(table.number_at(3, 2), Some(20.0));
        assert_eq!(table.number_at(3, 5), Some(2.0));
    }

    #[test]
    fn series_with_differing_samples_does_not_misalign_the_table() {
        let mut grid = summary_grid();
        // drug A's pair for Y is incomplete, so extract drops that sample
        // from the Y series only
        grid.set(3, 2, Cell::text("gone"));
        let series = extract(&grid, &["X".to_string(), "Y".to_string()]);
        assert_eq!(series[0].sample_names, ["drug A", "drug B"]);
        assert_eq!(series[1].sample_names, ["drug B"]);

        let table = plot_table(&series, "Trial7", true);
        // Y is left out rather than written against the wrong sample rows
        assert_eq!(table.text_at(1, 2).as_deref(), Some("Trial7 - X"));
        assert!(table.get(1, 4).is_none());
        assert_eq!(table.text_at(3, 1).as_deref(), Some("drug B"));
        assert_eq!(table.number_at(3, 2), Some(20.0));
    }

    #[test]
    fn plot_table_without_error_bars_is_narrow() {
        let series = extract(&summary_grid(), &["X".to_string(), "Y".to_string()]);
        let table = plot_table(&series, "Trial7", false);
        assert_eq!(table.text_at(1, 3).as_deref(), Some("Trial7 - Y"));
        assert_eq!(table.col_count(), 3);
    }
}
