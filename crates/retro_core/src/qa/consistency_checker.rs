//! # Cross-Dataset Consistency Checker
//!
//! Compares two [`AggregateSet`]s key by key and stat by stat. Both sides
//! go through the same code path whether they were derived here or read
//! from an external reference; only the tolerance differs.
//!
//! Disagreement is collected, never raised: every uncovered key and every
//! out-of-tolerance stat becomes a failing [`ComparisonResult`], so one
//! run shows the whole extent of a schema drift.

use crate::aggregate::{AggregateRecord, AggregateSet};
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

/// Allowed relative difference; 0 requires exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance(pub f64);

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance(0.0);

    pub fn is_exact(&self) -> bool {
        self.0 == 0.0
    }

    /// Whether `left` is close enough to `right`.
    pub fn allows(&self, left: i64, right: i64) -> bool {
        if self.is_exact() {
            return left == right;
        }
        match relative_difference(left, right) {
            Some(rel) => rel <= self.0,
            None => false,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::EXACT
    }
}

/// `|left - right| / |right|`, measured against the right-hand side.
///
/// Two zeros differ by 0; a non-zero value against a zero has no finite
/// relative difference and yields `None`.
pub fn relative_difference(left: i64, right: i64) -> Option<f64> {
    if left == right {
        return Some(0.0);
    }
    if right == 0 {
        return None;
    }
    Some((left - right).unsigned_abs() as f64 / right.unsigned_abs() as f64)
}

/// A stat compared across the two sides, possibly under different names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatPair {
    pub left: String,
    pub right: String,
}

impl StatPair {
    pub fn same(name: &str) -> Self {
        Self {
            left: name.to_string(),
            right: name.to_string(),
        }
    }

    pub fn renamed(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Name used in reports.
    pub fn label(&self) -> String {
        if self.left == self.right {
            self.left.clone()
        } else {
            format!("{}/{}", self.left, self.right)
        }
    }
}

/// Why a comparison result failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// The key exists only on the left side.
    MissingRight,
    /// The key exists only on the right side.
    MissingLeft,
    ToleranceExceeded,
}

impl FindingKind {
    pub fn is_coverage(&self) -> bool {
        matches!(self, FindingKind::MissingLeft | FindingKind::MissingRight)
    }
}

/// One stat of one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub key: Vec<String>,
    pub stat: String,
    pub left: Option<i64>,
    pub right: Option<i64>,
    pub abs_diff: Option<i64>,
    pub rel_diff: Option<f64>,
    pub passed: bool,
    pub finding: Option<FindingKind>,
}

impl ComparisonResult {
    fn compared(key: &[String], stat: String, left: i64, right: i64, tolerance: Tolerance) -> Self {
        let passed = tolerance.allows(left, right);
        Self {
            key: key.to_vec(),
            stat,
            left: Some(left),
            right: Some(right),
            abs_diff: Some((left - right).abs()),
            rel_diff: relative_difference(left, right),
            passed,
            finding: (!passed).then_some(FindingKind::ToleranceExceeded),
        }
    }

    fn uncovered(key: &[String], stat: String, left: Option<i64>, right: Option<i64>) -> Self {
        let finding = if left.is_some() {
            FindingKind::MissingRight
        } else {
            FindingKind::MissingLeft
        };
        Self {
            key: key.to_vec(),
            stat,
            left,
            right,
            abs_diff: None,
            rel_diff: None,
            passed: false,
            finding: Some(finding),
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<i64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        write!(
            f,
            "[{}] {}: left={}, right={}",
            self.key.join(", "),
            self.stat,
            show(self.left),
            show(self.right)
        )?;
        match self.finding {
            Some(FindingKind::MissingRight) => write!(f, " (key missing on right)"),
            Some(FindingKind::MissingLeft) => write!(f, " (key missing on left)"),
            Some(FindingKind::ToleranceExceeded) => match self.rel_diff {
                Some(rel) => write!(f, " (diff={}, rel={:.4})", show(self.abs_diff), rel),
                None => write!(f, " (diff={})", show(self.abs_diff)),
            },
            None => Ok(()),
        }
    }
}

/// All results of comparing two rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub name: String,
    pub left_source: String,
    pub right_source: String,
    pub key_names: Vec<String>,
    pub tolerance: Tolerance,
    pub results: Vec<ComparisonResult>,
}

impl ComparisonReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn coverage_failures(&self) -> usize {
        self.failures()
            .filter(|r| r.finding.is_some_and(|k| k.is_coverage()))
            .count()
    }

    pub fn tolerance_failures(&self) -> usize {
        self.failures()
            .filter(|r| r.finding == Some(FindingKind::ToleranceExceeded))
            .count()
    }
}

/// Compare `left` and `right` over `stats` for every key on either side.
///
/// Both sides must share key names, and every record must carry the
/// stats it is compared on; either mismatch is a structural error.
pub fn compare(
    name: &str,
    left: &AggregateSet,
    right: &AggregateSet,
    stats: &[StatPair],
    tolerance: Tolerance,
) -> Result<ComparisonReport, SchemaError> {
    if left.key_names != right.key_names {
        return Err(SchemaError::MissingColumns {
            dataset: right.source.clone(),
            columns: left.key_names.clone(),
        });
    }

    let keys: BTreeSet<&Vec<String>> = left.records.keys().chain(right.records.keys()).collect();
    let mut results = Vec::with_capacity(keys.len() * stats.len());

    for key in keys {
        let l = left.get(key);
        let r = right.get(key);
        for pair in stats {
            let lv = l.map(|rec| stat_value(rec, &left.source, &pair.left)).transpose()?;
            let rv = r.map(|rec| stat_value(rec, &right.source, &pair.right)).transpose()?;
            let result = match (lv, rv) {
                (Some(lv), Some(rv)) => ComparisonResult::compared(key, pair.label(), lv, rv, tolerance),
                (lv, rv) => ComparisonResult::uncovered(key, pair.label(), lv, rv),
            };
            results.push(result);
        }
    }

    let report = ComparisonReport {
        name: name.to_string(),
        left_source: left.source.clone(),
        right_source: right.source.clone(),
        key_names: left.key_names.clone(),
        tolerance,
        results,
    };

    if report.passed() {
        info!(comparison = name, checks = report.results.len(), "consistent");
    } else {
        warn!(
            comparison = name,
            checks = report.results.len(),
            coverage = report.coverage_failures(),
            tolerance = report.tolerance_failures(),
            "inconsistent"
        );
    }
    Ok(report)
}

fn stat_value(record: &AggregateRecord, source: &str, stat: &str) -> Result<i64, SchemaError> {
    record.get(stat).ok_or_else(|| SchemaError::MissingColumns {
        dataset: source.to_string(),
        columns: vec![stat.to_string()],
    })
}

/// A declared comparison that could not run with this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedComparison {
    pub name: String,
    pub reason: String,
}

/// Every comparison of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub comparisons: Vec<ComparisonReport>,
    pub skipped: Vec<SkippedComparison>,
}

impl ConsistencyReport {
    /// True only when every result of every comparison passed.
    pub fn passed(&self) -> bool {
        self.comparisons.iter().all(ComparisonReport::passed)
    }

    pub fn failure_count(&self) -> usize {
        self.comparisons.iter().map(|c| c.failures().count()).sum()
    }

    pub fn check_count(&self) -> usize {
        self.comparisons.iter().map(|c| c.results.len()).sum()
    }

    pub fn skip(&mut self, name: &str, reason: &str) {
        self.skipped.push(SkippedComparison {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Human-readable summary listing every failing result.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for c in &self.comparisons {
            let verdict = if c.passed() { "PASS" } else { "FAIL" };
            lines.push(format!(
                "{} {} ({} vs {}, {} checks, tolerance {})",
                verdict,
                c.name,
                c.left_source,
                c.right_source,
                c.results.len(),
                c.tolerance.0
            ));
            for failure in c.failures() {
                lines.push(format!("  - {}", failure));
            }
        }
        for s in &self.skipped {
            lines.push(format!("SKIP {} ({})", s.name, s.reason));
        }
        lines.push(format!(
            "Overall: {} ({} failing of {} checks)",
            if self.passed() { "PASS" } else { "FAIL" },
            self.failure_count(),
            self.check_count()
        ));
        lines
    }
}
