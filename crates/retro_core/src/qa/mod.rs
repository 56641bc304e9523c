//! # QA Module
//!
//! Cross-dataset validation of the wrangled tables.
//!
//! - `consistency_checker` - key-by-key comparison of two rollups
//! - `plan` - the declared comparisons between events, team_game, the
//!   player tables and the external reference

pub mod consistency_checker;
pub mod plan;

pub use consistency_checker::{
    compare, relative_difference, ComparisonReport, ComparisonResult, ConsistencyReport,
    FindingKind, SkippedComparison, StatPair, Tolerance,
};
pub use plan::{check_consistency, event_rollup, CheckInputs};
