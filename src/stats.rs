// stats.rs

use log::warn;
use statrs::statistics::Statistics;

use crate::grid::{Cell, SparseGrid};
use crate::layout::{VerboseLayout, STAT_LABELS};

/// Why a statistic came out non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFiniteReason {
    /// A zero-valued control poisoned the percent-change series.
    ZeroControl,
    /// n == 1: the sample standard deviation has no n-1 denominator.
    TooFewObservations,
    /// No experiment contributed a value for this (variable, sample) pair.
    NoObservations,
}

/// A statistic that is either a usable number or a tagged non-finite result.
/// Arithmetic edge cases are recovered locally and carried through as tags;
/// how a tag is rendered is the writers' concern, not this module's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Finite(f64),
    NonFinite(NonFiniteReason),
}

impl StatValue {
    fn tag(value: f64, reason: NonFiniteReason) -> Self {
        if value.is_finite() {
            StatValue::Finite(value)
        } else {
            StatValue::NonFinite(reason)
        }
    }

    pub fn finite(&self) -> Option<f64> {
        match self {
            StatValue::Finite(v) => Some(*v),
            StatValue::NonFinite(_) => None,
        }
    }

    /// Raw numeric view for the verbose grid, where non-finite results are
    /// written through as IEEE NaN.
    fn verbose_cell(&self) -> Cell {
        match self {
            StatValue::Finite(v) => Cell::Number(*v),
            StatValue::NonFinite(_) => Cell::Number(f64::NAN),
        }
    }
}

/// Percent-change statistics for one (variable, sample) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSummary {
    pub mean: StatValue,
    pub n: usize,
    pub sqrt_n: f64,
    pub stdev: StatValue,
    pub sem: StatValue,
}

/// One engine result, self-describing rather than positional: the Summary
/// Writer addresses records by these indices instead of relying on a shared
/// iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub variable: usize,
    pub sample: usize,
    pub summary: StatSummary,
}

/// Percent change of a value against its control.
pub fn percent_change(value: f64, control: f64) -> f64 {
    (value - control) / control * 100.0
}

/// Runs the engine over an already-written verbose grid.
///
/// For every variable and every non-control sample position, reads the raw
/// values back from the grid, writes the percent-change column and the four
/// stat lines, and collects a record. Reading back what the Verbose Writer
/// placed is deliberate: it exercises the shared layout on every run.
pub fn calculate(
    grid: &mut SparseGrid,
    layout: &VerboseLayout,
    num_variables: usize,
    num_samples: usize,
) -> Vec<StatRecord> {
    let mut records = Vec::new();

    for variable in 0..num_variables {
        for sample in 1..num_samples {
            for (line, label) in STAT_LABELS.iter().enumerate() {
                grid.set(
                    layout.stat_row(variable, line),
                    layout.value_col(sample),
                    Cell::text(*label),
                );
            }

            let mut changes = Vec::new();
            let mut saw_zero_control = false;
            for experiment in 1..=layout.num_experiments {
                let row = layout.value_row(variable, experiment);
                let Some(value) = grid.number_at(row, layout.value_col(sample)) else {
                    continue;
                };
                let Some(control) = grid.number_at(row, layout.value_col(0)) else {
                    warn!(
                        "value at ({}, {}) has no control beside it; skipping",
                        row,
                        layout.value_col(sample)
                    );
                    continue;
                };
                if control == 0.0 {
                    saw_zero_control = true;
                }
                let change = percent_change(value, control);
                grid.set(row, layout.percent_col(sample), Cell::Number(change));
                changes.push(change);
            }

            let summary = summarize(&changes, saw_zero_control);
            grid.set(
                layout.stat_row(variable, 0),
                layout.percent_col(sample),
                summary.mean.verbose_cell(),
            );
            grid.set(
                layout.stat_row(variable, 1),
                layout.percent_col(sample),
                Cell::Number(summary.n as f64),
            );
            grid.set(
                layout.stat_row(variable, 1),
                layout.sqrt_n_col(sample),
                Cell::Number(summary.sqrt_n),
            );
            grid.set(
                layout.stat_row(variable, 2),
                layout.percent_col(sample),
                summary.stdev.verbose_cell(),
            );
            grid.set(
                layout.stat_row(variable, 3),
                layout.percent_col(sample),
                summary.sem.verbose_cell(),
            );

            records.push(StatRecord {
                variable,
                sample,
                summary,
            });
        }
    }

    records
}

/// Mean, sample standard deviation (n-1 denominator) and SEM of a
/// percent-change series. A non-finite entry poisons the whole aggregate
/// (IEEE NaN arithmetic), matching the established output convention.
fn summarize(changes: &[f64], saw_zero_control: bool) -> StatSummary {
    let n = changes.len();
    let sqrt_n = (n as f64).sqrt();
    let mean = changes.iter().mean();
    let stdev = changes.iter().std_dev();
    let sem = stdev / sqrt_n;

    let reason = if saw_zero_control {
        NonFiniteReason::ZeroControl
    } else if n == 0 {
        NonFiniteReason::NoObservations
    } else {
        NonFiniteReason::TooFewObservations
    };

    StatSummary {
        mean: StatValue::tag(mean, reason),
        n,
        sqrt_n,
        stdev: StatValue::tag(stdev, reason),
        sem: StatValue::tag(sem, reason),
    }
}
