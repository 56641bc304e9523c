//! # Schemas and Projections
//!
//! - `catalog` - declared input schemas and partitions
//! - `projection` - the column-projection primitive (split and select)
//! - `selection` - play-by-play field selection modes

pub mod catalog;
pub mod projection;
pub mod selection;

pub use projection::{ColumnGroup, Projection};
pub use selection::FieldSelection;

use crate::error::SchemaError;
use crate::table::Table;
use rustc_hash::FxHashSet;
use tracing::info;

/// Declared header of one external dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    dataset: String,
    keys: Vec<String>,
    columns: Vec<String>,
}

impl Schema {
    pub fn new(dataset: &str, keys: Vec<String>, columns: Vec<String>) -> Self {
        Self {
            dataset: dataset.to_string(),
            keys,
            columns,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Compare an input header with the declaration. Missing columns are
    /// reported before undeclared ones.
    pub fn check_header(&self, header: &[String]) -> Result<(), SchemaError> {
        let header_set: FxHashSet<&str> = header.iter().map(String::as_str).collect();
        let declared: FxHashSet<&str> = self.columns.iter().map(String::as_str).collect();

        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !header_set.contains(c.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                dataset: self.dataset.clone(),
                columns: missing,
            });
        }

        let unexpected: Vec<String> = header
            .iter()
            .filter(|c| !declared.contains(c.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(SchemaError::UnexpectedColumns {
                dataset: self.dataset.clone(),
                columns: unexpected,
            });
        }
        Ok(())
    }

    /// Validate `table` and reorder its columns to the declared order.
    pub fn conform(&self, table: &Table) -> Result<Table, SchemaError> {
        self.check_header(table.columns())?;
        let conformed = table.select(&self.dataset, &self.columns)?;
        info!(
            dataset = %self.dataset,
            rows = conformed.len(),
            columns = conformed.columns().len(),
            "dataset conforms to declared schema"
        );
        Ok(conformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn schema() -> Schema {
        Schema::new("t", cols(&["id"]), cols(&["id", "a", "b"]))
    }

    #[test]
    fn test_check_header_any_order() {
        schema().check_header(&cols(&["b", "id", "a"])).unwrap();
    }

    #[test]
    fn test_check_header_missing_and_extra() {
        let err = schema().check_header(&cols(&["id", "a"])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                dataset: "t".into(),
                columns: cols(&["b"])
            }
        );

        let err = schema()
            .check_header(&cols(&["id", "a", "b", "renamed_c"]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnexpectedColumns {
                dataset: "t".into(),
                columns: cols(&["renamed_c"])
            }
        );
    }

    #[test]
    fn test_conform_reorders() {
        let table = Table::from_rows(
            "raw",
            cols(&["b", "id", "a"]),
            vec![cols(&["3", "1", "2"])],
        )
        .unwrap();
        let t = schema().conform(&table).unwrap();
        assert_eq!(t.columns(), &["id", "a", "b"]);
        assert_eq!(t.rows()[0], cols(&["1", "2", "3"]));
    }
}
