//! Appends decoded columns to the play-by-play dataset.

use super::code::decode_event;
use super::derived::DerivedField;
use crate::error::{Result, SchemaError};
use crate::schema::catalog::{event_schema, EVENT, EVENT_REQUIRED};
use crate::schema::FieldSelection;
use crate::table::Table;
use tracing::info;

/// Decoded play-by-play data.
#[derive(Debug, Clone)]
pub struct EnrichedEvents {
    /// Selected columns followed by the derived columns; written out.
    pub output: Table,
    /// Identity and team columns plus the derived columns, for every
    /// play regardless of selection; used for aggregation.
    pub derived: Table,
}

/// Decode every play of a raw event table.
///
/// The input header must match the declared event schema. Rows keep
/// their input order; the first undecodable code aborts the whole
/// dataset.
pub fn enrich_events(raw: &Table, selection: &FieldSelection) -> Result<EnrichedEvents> {
    let schema = event_schema();
    let events = schema.conform(raw)?;
    let projected = selection
        .projection(&schema)?
        .select(&events)?
        .pop()
        .ok_or_else(|| SchemaError::MissingColumns {
            dataset: EVENT.to_string(),
            columns: vec!["selected fields".to_string()],
        })?;

    let derived_names: Vec<&str> = DerivedField::ALL.iter().map(|f| f.column()).collect();

    let mut out_columns = projected.columns().to_vec();
    out_columns.extend(derived_names.iter().map(|c| c.to_string()));
    let mut derived_columns: Vec<String> = EVENT_REQUIRED
        .iter()
        .filter(|c| **c != "event_tx")
        .map(|c| c.to_string())
        .collect();
    derived_columns.extend(derived_names.iter().map(|c| c.to_string()));

    let game_col = events.require_column("game_id")?;
    let event_col = events.require_column("event_id")?;
    let tx_col = events.require_column("event_tx")?;
    let bat_col = events.require_column("bat_team_id")?;
    let fld_col = events.require_column("fld_team_id")?;

    let mut output = Table::new(EVENT, out_columns)?;
    let mut derived = Table::new("event_derived", derived_columns)?;

    for (source, selected) in events.rows().iter().zip(projected.into_rows()) {
        let fields = decode_event(&source[game_col], &source[event_col], &source[tx_col])?;
        let values = fields.to_row();

        let mut out_row = selected;
        out_row.extend(values.iter().cloned());
        output.push_row(out_row)?;

        let mut derived_row = vec![
            source[game_col].clone(),
            source[event_col].clone(),
            source[bat_col].clone(),
            source[fld_col].clone(),
        ];
        derived_row.extend(values);
        derived.push_row(derived_row)?;
    }

    info!(
        rows = output.len(),
        columns = output.columns().len(),
        "decoded play-by-play transaction codes"
    );
    Ok(EnrichedEvents { output, derived })
}
