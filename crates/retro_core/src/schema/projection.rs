//! Declarative column projection.
//!
//! A [`Projection`] maps output-table names to column sets that share a
//! set of key columns. Splitting a wide dataset and selecting a field
//! subset are both projections; they differ only in whether every
//! non-key input column must be claimed by some group.

use crate::error::SchemaError;
use crate::table::Table;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A named output table's non-key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<String>,
}

impl ColumnGroup {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    dataset: String,
    keys: Vec<String>,
    groups: Vec<ColumnGroup>,
}

impl Projection {
    pub fn new(dataset: &str, keys: Vec<String>, groups: Vec<ColumnGroup>) -> Self {
        Self {
            dataset: dataset.to_string(),
            keys,
            groups,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    /// Check the projection against the columns a dataset offers.
    ///
    /// Every key and group column must exist, no column may belong to
    /// two groups (keys count as a group of their own), and with
    /// `full_coverage` every non-key column must belong to a group.
    pub fn validate(&self, available: &[String], full_coverage: bool) -> Result<(), SchemaError> {
        let available_set: FxHashSet<&str> = available.iter().map(String::as_str).collect();

        let unknown: Vec<String> = self
            .keys
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.columns.iter()))
            .filter(|c| !available_set.contains(c.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaError::UnknownFields {
                dataset: self.dataset.clone(),
                fields: unknown,
            });
        }

        let mut owner: FxHashMap<&str, &str> = FxHashMap::default();
        for key in &self.keys {
            owner.insert(key.as_str(), "<keys>");
        }
        for group in &self.groups {
            for col in &group.columns {
                if let Some(first) = owner.insert(col.as_str(), group.name.as_str()) {
                    return Err(SchemaError::OverlappingColumns {
                        dataset: self.dataset.clone(),
                        column: col.clone(),
                        first: first.to_string(),
                        second: group.name.clone(),
                    });
                }
            }
        }

        if full_coverage {
            let uncovered: Vec<String> = available
                .iter()
                .filter(|c| !owner.contains_key(c.as_str()))
                .cloned()
                .collect();
            if !uncovered.is_empty() {
                return Err(SchemaError::UncoveredColumns {
                    dataset: self.dataset.clone(),
                    columns: uncovered,
                });
            }
        }
        Ok(())
    }

    /// Ordered output columns of one group: keys first, then the group.
    pub fn output_columns(&self, group: &ColumnGroup) -> Vec<String> {
        self.keys
            .iter()
            .chain(group.columns.iter())
            .cloned()
            .collect()
    }

    /// Split `table` into one table per group. Every non-key column of
    /// the input must be claimed by exactly one group.
    pub fn split(&self, table: &Table) -> Result<Vec<Table>, SchemaError> {
        self.validate(table.columns(), true)?;
        self.apply(table)
    }

    /// Select the projection's columns without requiring coverage.
    pub fn select(&self, table: &Table) -> Result<Vec<Table>, SchemaError> {
        self.validate(table.columns(), false)?;
        self.apply(table)
    }

    fn apply(&self, table: &Table) -> Result<Vec<Table>, SchemaError> {
        self.groups
            .iter()
            .map(|group| {
                let out = table.select(&group.name, &self.output_columns(group))?;
                debug!(
                    dataset = %self.dataset,
                    group = %group.name,
                    columns = out.columns().len(),
                    rows = out.len(),
                    "projected"
                );
                Ok(out)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn wide() -> Table {
        Table::from_rows(
            "wide",
            cols(&["id", "b_h", "b_hr", "p_so", "f_c_po"]),
            vec![cols(&["1", "2", "0", "7", "9"]), cols(&["2", "1", "1", "0", "3"])],
        )
        .unwrap()
    }

    fn partition(groups: Vec<ColumnGroup>) -> Projection {
        Projection::new("wide", cols(&["id"]), groups)
    }

    #[test]
    fn test_split_replicates_keys() {
        let p = partition(vec![
            ColumnGroup::new("batting", cols(&["b_h", "b_hr"])),
            ColumnGroup::new("pitching", cols(&["p_so"])),
            ColumnGroup::new("fielding", cols(&["f_c_po"])),
        ]);
        let out = p.split(&wide()).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name(), "batting");
        assert_eq!(out[0].columns(), &["id", "b_h", "b_hr"]);
        assert_eq!(out[2].rows()[1], cols(&["2", "3"]));
        for t in &out {
            assert_eq!(t.columns()[0], "id");
            assert_eq!(t.len(), 2);
        }
    }

    #[test]
    fn test_split_rejects_uncovered_column() {
        let p = partition(vec![
            ColumnGroup::new("batting", cols(&["b_h", "b_hr"])),
            ColumnGroup::new("pitching", cols(&["p_so"])),
        ]);
        let err = p.split(&wide()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UncoveredColumns {
                dataset: "wide".into(),
                columns: cols(&["f_c_po"])
            }
        );
    }

    #[test]
    fn test_split_rejects_overlap() {
        let p = partition(vec![
            ColumnGroup::new("batting", cols(&["b_h", "b_hr", "p_so"])),
            ColumnGroup::new("pitching", cols(&["p_so", "f_c_po"])),
        ]);
        let err = p.split(&wide()).unwrap_err();
        assert!(matches!(err, SchemaError::OverlappingColumns { ref column, .. } if column == "p_so"));
    }

    #[test]
    fn test_key_inside_group_is_overlap() {
        let p = partition(vec![ColumnGroup::new(
            "all",
            cols(&["id", "b_h", "b_hr", "p_so", "f_c_po"]),
        )]);
        assert!(p.split(&wide()).is_err());
    }

    #[test]
    fn test_select_does_not_require_coverage() {
        let p = partition(vec![ColumnGroup::new("subset", cols(&["p_so"]))]);
        let out = p.select(&wide()).unwrap();
        assert_eq!(out[0].columns(), &["id", "p_so"]);
    }

    #[test]
    fn test_unknown_group_column() {
        let p = partition(vec![ColumnGroup::new("subset", cols(&["b_sb"]))]);
        let err = p.select(&wide()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownFields {
                dataset: "wide".into(),
                fields: cols(&["b_sb"])
            }
        );
    }

    proptest! {
        /// Any assignment of non-key columns to groups yields outputs whose
        /// non-key columns partition the input's non-key columns.
        #[test]
        fn prop_split_partitions_columns(assign in proptest::collection::vec(0usize..3, 6)) {
            let names: Vec<String> = (0..6).map(|i| format!("c{}", i)).collect();
            let mut header = vec!["k".to_string()];
            header.extend(names.iter().cloned());
            let row: Vec<String> = (0..7).map(|i| i.to_string()).collect();
            let table = Table::from_rows("t", header, vec![row]).unwrap();

            let mut groups: Vec<ColumnGroup> =
                (0..3).map(|g| ColumnGroup::new(&format!("g{}", g), Vec::new())).collect();
            for (name, g) in names.iter().zip(&assign) {
                groups[*g].columns.push(name.clone());
            }
            let p = Projection::new("t", vec!["k".to_string()], groups);
            let out = p.split(&table).unwrap();

            let mut seen: Vec<String> = out
                .iter()
                .flat_map(|t| t.columns()[1..].to_vec())
                .collect();
            seen.sort();
            prop_assert_eq!(seen, names);
            for t in &out {
                prop_assert_eq!(&t.columns()[0], "k");
            }
        }
    }
}
