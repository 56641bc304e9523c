//! Play-by-play field selection.

use super::catalog::EVENT_DEFAULT_FIELDS;
use super::projection::{ColumnGroup, Projection};
use super::Schema;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

/// Which play-by-play columns to keep in the output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SelectionRepr", into = "SelectionRepr")]
pub enum FieldSelection {
    /// The curated subset.
    #[default]
    Default,
    /// Every declared field, in declared order.
    All,
    /// Exactly these fields, in this order.
    Fields(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SelectionMode {
    Default,
    All,
}

/// `default`, `all`, or a list of names.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Mode(SelectionMode),
    Fields(Vec<String>),
}

impl From<SelectionRepr> for FieldSelection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::Mode(SelectionMode::Default) => FieldSelection::Default,
            SelectionRepr::Mode(SelectionMode::All) => FieldSelection::All,
            SelectionRepr::Fields(fields) => FieldSelection::Fields(fields),
        }
    }
}

impl From<FieldSelection> for SelectionRepr {
    fn from(selection: FieldSelection) -> Self {
        match selection {
            FieldSelection::Default => SelectionRepr::Mode(SelectionMode::Default),
            FieldSelection::All => SelectionRepr::Mode(SelectionMode::All),
            FieldSelection::Fields(fields) => SelectionRepr::Fields(fields),
        }
    }
}

impl FieldSelection {
    /// Parse a CLI value: `default`, `all`, or comma-separated names.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "default" => FieldSelection::Default,
            "all" => FieldSelection::All,
            list => FieldSelection::Fields(
                list.split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            ),
        }
    }

    /// Resolve to an ordered column list against `schema`.
    ///
    /// Every explicitly named field must be declared; all offenders are
    /// named in the error. A repeated name is kept once.
    pub fn resolve(&self, schema: &Schema) -> Result<Vec<String>, SchemaError> {
        let requested: Vec<String> = match self {
            FieldSelection::Default => EVENT_DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            FieldSelection::All => return Ok(schema.columns().to_vec()),
            FieldSelection::Fields(fields) => fields.clone(),
        };

        let unknown: Vec<String> = requested
            .iter()
            .filter(|f| !schema.contains(f))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaError::UnknownFields {
                dataset: schema.dataset().to_string(),
                fields: unknown,
            });
        }

        let mut ordered: Vec<String> = Vec::with_capacity(requested.len());
        for field in requested {
            if !ordered.contains(&field) {
                ordered.push(field);
            }
        }
        Ok(ordered)
    }

    /// Single-group projection of `schema` onto the resolved fields.
    pub fn projection(&self, schema: &Schema) -> Result<Projection, SchemaError> {
        Ok(Projection::new(
            schema.dataset(),
            Vec::new(),
            vec![ColumnGroup::new(schema.dataset(), self.resolve(schema)?)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{event_schema, EVENT_FIELDS};

    #[test]
    fn test_all_returns_every_declared_field() {
        let cols = FieldSelection::All.resolve(&event_schema()).unwrap();
        assert_eq!(cols.len(), EVENT_FIELDS.len());
        for (got, declared) in cols.iter().zip(EVENT_FIELDS) {
            assert_eq!(got, declared);
        }
    }

    #[test]
    fn test_default_is_curated_subset() {
        let cols = FieldSelection::Default.resolve(&event_schema()).unwrap();
        assert_eq!(cols.len(), EVENT_DEFAULT_FIELDS.len());
        assert!(cols.len() < EVENT_FIELDS.len());
        assert_eq!(cols[0], "game_id");
    }

    #[test]
    fn test_unknown_field_is_named() {
        let sel = FieldSelection::Fields(vec![
            "game_id".into(),
            "not_a_field".into(),
            "event_tx".into(),
            "also_missing".into(),
        ]);
        let err = sel.resolve(&event_schema()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownFields {
                dataset: "event".into(),
                fields: vec!["not_a_field".into(), "also_missing".into()],
            }
        );
        assert!(err.to_string().contains("not_a_field"));
    }

    #[test]
    fn test_explicit_order_kept_and_deduplicated() {
        let sel = FieldSelection::parse("event_tx, game_id,event_tx");
        let cols = sel.resolve(&event_schema()).unwrap();
        assert_eq!(cols, vec!["event_tx".to_string(), "game_id".to_string()]);
    }

    #[test]
    fn test_projection_selects_in_requested_order() {
        let schema = event_schema();
        let row: Vec<String> = schema.columns().iter().map(|c| format!("{}-v", c)).collect();
        let table = crate::table::Table::from_rows("event", schema.columns().to_vec(), vec![row]).unwrap();

        let mut out = FieldSelection::parse("event_tx,game_id")
            .projection(&schema)
            .unwrap()
            .select(&table)
            .unwrap();
        assert_eq!(out.len(), 1);
        let selected = out.pop().unwrap();
        assert_eq!(selected.name(), "event");
        assert_eq!(selected.columns(), &["event_tx", "game_id"]);
        assert_eq!(selected.get(0, "event_tx"), Some("event_tx-v"));
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(FieldSelection::parse("all"), FieldSelection::All);
        assert_eq!(FieldSelection::parse("default"), FieldSelection::Default);
    }

    #[test]
    fn test_serde_forms() {
        let all: FieldSelection = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, FieldSelection::All);
        let list: FieldSelection = serde_json::from_str("[\"game_id\",\"event_tx\"]").unwrap();
        assert_eq!(
            list,
            FieldSelection::Fields(vec!["game_id".into(), "event_tx".into()])
        );
        assert_eq!(serde_json::to_string(&FieldSelection::Default).unwrap(), "\"default\"");
    }
}
