// layout.rs

/// Coordinate arithmetic for the verbose ("- FORMATTED") grid.
///
/// The verbose grid groups columns by sample position and rows by experiment,
/// stacking variables at a fixed stride. The Verbose Writer and the Statistics
/// Engine both address cells through this planner; the two sides corrupt each
/// other silently if their formulas ever drift, so the formulas live here and
/// nowhere else.
///
/// Column bands: the control (sample position 0) occupies columns 1-3; every
/// later position `p` occupies a 4-column band starting at `4p`:
/// label, raw value, percent-change / stat values, sqrt(n).
#[derive(Debug, Clone, Copy)]
pub struct VerboseLayout {
    pub num_experiments: usize,
}

/// Stat rows carry these labels in the raw-value column, values one column
/// to the right. The strings are load-bearing for downstream tooling.
pub const STAT_LABELS: [&str; 4] = ["mean=", "n=", "StDev=", "SEM="];

impl VerboseLayout {
    pub fn new(num_experiments: usize) -> Self {
        Self { num_experiments }
    }

    /// Rows between successive variables of the same sample: one row per
    /// experiment, four stat rows, and two blank rows.
    pub fn variable_stride(&self) -> usize {
        self.num_experiments + 6
    }

    /// Row of the raw value for a 0-based variable index and 1-based
    /// experiment index.
    pub fn value_row(&self, variable: usize, experiment: usize) -> usize {
        debug_assert!(experiment >= 1, "experiment indices are 1-based");
        experiment + variable * self.variable_stride()
    }

    /// Column of the `"<sample> : <variable>"` label for a sample position.
    pub fn label_col(&self, position: usize) -> usize {
        if position == 0 {
            1
        } else {
            4 * position
        }
    }

    /// Column of the raw value (and of the stat labels) for a sample position.
    pub fn value_col(&self, position: usize) -> usize {
        self.label_col(position) + 1
    }

    /// Column of the percent-change series (and of the stat values) for a
    /// non-control sample position.
    pub fn percent_col(&self, position: usize) -> usize {
        debug_assert!(position >= 1, "the control sample has no percent-change column");
        4 * position + 2
    }

    /// Column of sqrt(n), written beside the n cell.
    pub fn sqrt_n_col(&self, position: usize) -> usize {
        4 * position + 3
    }

    /// Row of the m-th stat line (0-based: mean, n, StDev, SEM) under a
    /// variable's block of experiment rows.
    pub fn stat_row(&self, variable: usize, line: usize) -> usize {
        variable * self.variable_stride() + self.num_experiments + 1 + line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_band_is_narrow() {
        let layout = VerboseLayout::new(3);
        assert_eq!(layout.label_col(0), 1);
        assert_eq!(layout.value_col(0), 2);
        assert_eq!(layout.label_col(1), 4);
        assert_eq!(layout.value_col(1), 5);
        assert_eq!(layout.percent_col(1), 6);
        assert_eq!(layout.sqrt_n_col(1), 7);
        assert_eq!(layout.label_col(2), 8);
    }

    #[test]
    fn rows_group_by_experiment_then_stack_by_variable() {
        let layout = VerboseLayout::new(2);
        assert_eq!(layout.variable_stride(), 8);
        assert_eq!(layout.value_row(0, 1), 1);
        assert_eq!(layout.value_row(0, 2), 2);
        assert_eq!(layout.value_row(1, 1), 9);
        assert_eq!(layout.value_row(1, 2), 10);
    }

    #[test]
    fn stat_rows_sit_under_the_experiment_rows() {
        let layout = VerboseLayout::new(2);
        // variable 0: experiments on rows 1-2, stats on rows 3-6
        assert_eq!(layout.stat_row(0, 0), 3);
        assert_eq!(layout.stat_row(0, 3), 6);
        // variable 1 starts one stride down
        assert_eq!(layout.stat_row(1, 0), 11);
    }

    #[test]
    fn stat_rows_never_collide_with_value_rows() {
        let layout = VerboseLayout::new(4);
        for variable in 0..3 {
            for line in 0..4 {
                let stat = layout.stat_row(variable, line);
                for experiment in 1..=4 {
                    for v in 0..3 {
                        assert_ne!(stat, layout.value_row(v, experiment));
                    }
                }
            }
        }
    }
}
