//! In-memory tabular dataset.
//!
//! Cells stay as the text the parser emitted so pass-through columns are
//! written back unchanged; numeric interpretation happens only where a
//! value is summed or tested.

use crate::error::SchemaError;
use rustc_hash::FxHashMap;

/// A named table of string cells with a fixed header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table; duplicate column names are rejected.
    pub fn new<S: Into<String>>(name: &str, columns: Vec<S>) -> Result<Self, SchemaError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = FxHashMap::default();
        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    dataset: name.to_string(),
                    column: col.clone(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            columns,
            index,
            rows: Vec::new(),
        })
    }

    /// Build a table from a header and rows in one go.
    pub fn from_rows<S: Into<String>>(
        name: &str,
        columns: Vec<S>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, SchemaError> {
        let mut table = Self::new(name, columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), SchemaError> {
        if row.len() != self.columns.len() {
            return Err(SchemaError::RaggedRow {
                dataset: self.name.clone(),
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Index of a column that must exist.
    pub fn require_column(&self, column: &str) -> Result<usize, SchemaError> {
        self.column_index(column)
            .ok_or_else(|| SchemaError::MissingColumns {
                dataset: self.name.clone(),
                columns: vec![column.to_string()],
            })
    }

    /// Cell by row position and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Integer value of a cell. Empty or non-integer text is an error;
    /// `row` in the error is 1-based.
    pub fn int_at(&self, row: usize, col: usize) -> Result<i64, SchemaError> {
        let raw = self.rows[row][col].trim();
        raw.parse::<i64>().map_err(|_| SchemaError::InvalidNumber {
            dataset: self.name.clone(),
            row: row + 1,
            column: self.columns[col].clone(),
            value: raw.to_string(),
        })
    }

    /// New table holding `columns` (in the given order) of every row.
    pub fn select(&self, name: &str, columns: &[String]) -> Result<Table, SchemaError> {
        let positions = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Table::new(name, columns.to_vec())?;
        out.rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(out)
    }

    /// Rename columns in place; names for which `rename` returns `None`
    /// are kept.
    pub fn rename_columns<F>(&mut self, mut rename: F) -> Result<(), SchemaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| rename(c).unwrap_or_else(|| c.clone()))
            .collect();
        let rebuilt = Table::new(&self.name, renamed)?;
        self.columns = rebuilt.columns;
        self.index = rebuilt.index;
        Ok(())
    }

    /// Insert a column at `position`, filling each row from `value`.
    pub fn insert_column<F>(
        &mut self,
        position: usize,
        column: &str,
        mut value: F,
    ) -> Result<(), SchemaError>
    where
        F: FnMut(&[String]) -> String,
    {
        let mut columns = self.columns.clone();
        columns.insert(position, column.to_string());
        let rebuilt = Table::new(&self.name, columns)?;
        for row in &mut self.rows {
            let cell = value(row);
            row.insert(position, cell);
        }
        self.columns = rebuilt.columns;
        self.index = rebuilt.index;
        Ok(())
    }

    /// Append a column at the end.
    pub fn push_column<F>(&mut self, column: &str, value: F) -> Result<(), SchemaError>
    where
        F: FnMut(&[String]) -> String,
    {
        self.insert_column(self.columns.len(), column, value)
    }

    /// Remove the named columns; absent names are an error.
    pub fn drop_columns(&mut self, drop: &[&str]) -> Result<(), SchemaError> {
        let mut positions = drop
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        positions.sort_unstable_by(|a, b| b.cmp(a));
        let mut columns = self.columns.clone();
        for &p in &positions {
            columns.remove(p);
            for row in &mut self.rows {
                row.remove(p);
            }
        }
        let rebuilt = Table::new(&self.name, columns)?;
        self.columns = rebuilt.columns;
        self.index = rebuilt.index;
        Ok(())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Append the rows of `other`, which must have the same header.
    pub fn extend(&mut self, other: Table) -> Result<(), SchemaError> {
        if other.columns != self.columns {
            let missing: Vec<String> = self
                .columns
                .iter()
                .filter(|c| !other.has_column(c))
                .cloned()
                .collect();
            return Err(SchemaError::MissingColumns {
                dataset: other.name,
                columns: missing,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<String>> {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Table {
        Table::from_rows(
            "sample",
            vec!["game_id", "team_id", "r"],
            vec![row(&["G1", "BOS", "3"]), row(&["G1", "NYA", "5"])],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Table::new("t", vec!["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { ref column, .. } if column == "a"));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let mut t = sample();
        let err = t.push_row(row(&["G2", "BOS"])).unwrap_err();
        assert!(matches!(err, SchemaError::RaggedRow { row: 3, expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_select_reorders() {
        let t = sample();
        let s = t.select("s", &["r".to_string(), "game_id".to_string()]).unwrap();
        assert_eq!(s.columns(), &["r", "game_id"]);
        assert_eq!(s.rows()[1], row(&["5", "G1"]));
    }

    #[test]
    fn test_int_at_rejects_blank() {
        let mut t = sample();
        t.push_row(row(&["G2", "BOS", ""])).unwrap();
        assert_eq!(t.int_at(0, 2).unwrap(), 3);
        let err = t.int_at(2, 2).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNumber { row: 3, .. }));
    }

    #[test]
    fn test_column_edits() {
        let mut t = sample();
        t.insert_column(1, "at_home", |_| "true".to_string()).unwrap();
        t.push_column("double_r", |r| {
            (r[3].parse::<i64>().unwrap_or(0) * 2).to_string()
        })
        .unwrap();
        t.rename_columns(|c| (c == "r").then(|| "runs".to_string())).unwrap();
        t.drop_columns(&["team_id"]).unwrap();

        assert_eq!(t.columns(), &["game_id", "at_home", "runs", "double_r"]);
        assert_eq!(t.rows()[1], row(&["G1", "true", "5", "10"]));
        assert_eq!(t.get(0, "double_r"), Some("6"));
    }

    #[test]
    fn test_extend_requires_same_header() {
        let mut t = sample();
        let other = Table::new("other", vec!["game_id", "r"]).unwrap();
        assert!(t.extend(other).is_err());
        t.extend(sample()).unwrap();
        assert_eq!(t.len(), 4);
    }
}
