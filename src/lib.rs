// lib.rs

//! Reshapes repeated-experiment assay worksheets and computes
//! percent-change-from-control statistics.
//!
//! One format operation parses a raw grid of fixed-stride experiment blocks
//! into experiments -> samples -> (variable, value), writes a verbose
//! "- FORMATTED" grid with inline statistics, and condenses the means and
//! SEMs into a "- FINAL" grid, one row per variable and one column pair per
//! non-control sample. A separate plot operation re-parses a "- FINAL" grid
//! into per-variable series for charting.

pub mod format;
pub mod grid;
pub mod layout;
pub mod parse;
pub mod plot;
pub mod stats;
pub mod workbook;
