//! Retrosheet → Lahman id mappings.
//!
//! Lahman's people table carries the Retrosheet player id as `retro_id`
//! and its teams table the Retrosheet team id as `team_id_retro`. Only
//! ids that occur in the wrangled data are kept.

use crate::error::SchemaError;
use crate::table::Table;
use rustc_hash::FxHashSet;
use tracing::info;

pub const PLAYER_ID_MAPPING: &str = "player_id_mapping";
pub const TEAM_ID_MAPPING: &str = "team_id_mapping";

/// Lahman `player_id` with its Retrosheet `retro_id`.
pub const PLAYER_MAPPING_COLUMNS: &[&str] = &["player_id", "retro_id"];
/// Lahman `team_id` per season with its Retrosheet `team_id_retro`.
pub const TEAM_MAPPING_COLUMNS: &[&str] = &["year_id", "team_id", "team_id_retro"];

#[derive(Debug, Clone)]
pub struct IdMappings {
    pub players: Table,
    pub teams: Table,
}

/// Both mappings for the players and teams of `retro`, any table with
/// Retrosheet `player_id` and `team_id` columns.
pub fn id_mappings(people: &Table, teams: &Table, retro: &Table) -> Result<IdMappings, SchemaError> {
    Ok(IdMappings {
        players: player_id_mapping(people, retro)?,
        teams: team_id_mapping(teams, retro)?,
    })
}

pub fn player_id_mapping(people: &Table, retro: &Table) -> Result<Table, SchemaError> {
    let players = distinct(retro, "player_id")?;
    mapping(people, PLAYER_ID_MAPPING, PLAYER_MAPPING_COLUMNS, "retro_id", &players)
}

pub fn team_id_mapping(teams: &Table, retro: &Table) -> Result<Table, SchemaError> {
    let retro_teams = distinct(retro, "team_id")?;
    mapping(teams, TEAM_ID_MAPPING, TEAM_MAPPING_COLUMNS, "team_id_retro", &retro_teams)
}

fn distinct(table: &Table, column: &str) -> Result<FxHashSet<String>, SchemaError> {
    let col = table.require_column(column)?;
    Ok(table.rows().iter().map(|r| r[col].trim().to_string()).collect())
}

fn mapping(
    source: &Table,
    name: &str,
    columns: &[&str],
    retro_column: &str,
    keep: &FxHashSet<String>,
) -> Result<Table, SchemaError> {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut out = source.select(name, &columns)?;
    let retro = out.require_column(retro_column)?;
    out.retain_rows(|row| keep.contains(row[retro].trim()));
    info!(mapping = name, source = %source.name(), rows = out.len(), "id mapping built");
    Ok(out)
}
