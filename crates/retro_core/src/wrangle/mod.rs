//! # Role Wrangling
//!
//! Turns the wide parser outputs into tidy per-role tables:
//! - `player_game` - appearance, batting, pitching and melted fielding
//! - `game` - game attributes and stacked home/away team_game
//! - `id_mapping` - Retrosheet → Lahman player and team ids

pub mod game;
pub mod id_mapping;
pub mod player_game;

pub use game::{game_start, wrangle_game, GameTables};
pub use id_mapping::{id_mappings, player_id_mapping, team_id_mapping, IdMappings};
pub use player_game::{
    drop_redundant_appear_dt, merge_duplicate_players, wrangle_player_game, PlayerGameTables,
};

use crate::error::SchemaError;
use crate::table::Table;

/// Counting-stat cell; blank counts as 0.
pub(crate) fn count(table: &Table, row: usize, col: usize) -> Result<i64, SchemaError> {
    if table.rows()[row][col].trim().is_empty() {
        return Ok(0);
    }
    table.int_at(row, col)
}

/// `prefix` removed, then `renames` applied to the remainder. Columns
/// without the prefix are left alone.
pub(crate) fn strip_prefix_renamed(
    column: &str,
    prefix: &str,
    renames: &[(&str, &str)],
) -> Option<String> {
    let rest = column.strip_prefix(prefix)?;
    let name = renames
        .iter()
        .find(|(from, _)| *from == rest)
        .map_or(rest, |(_, to)| *to);
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix_renamed() {
        let renames = [("2b", "double")];
        assert_eq!(strip_prefix_renamed("b_2b", "b_", &renames).as_deref(), Some("double"));
        assert_eq!(strip_prefix_renamed("b_hr", "b_", &renames).as_deref(), Some("hr"));
        assert_eq!(strip_prefix_renamed("team_id", "b_", &renames), None);
    }

    #[test]
    fn test_blank_counts_as_zero() {
        let t = Table::from_rows(
            "t",
            vec!["a", "b"],
            vec![vec!["".to_string(), "4".to_string()]],
        )
        .unwrap();
        assert_eq!(count(&t, 0, 0).unwrap(), 0);
        assert_eq!(count(&t, 0, 1).unwrap(), 4);
    }
}
