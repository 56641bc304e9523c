//! player_game → appearance, batting, pitching, fielding.

use super::{count, strip_prefix_renamed};
use crate::error::SchemaError;
use crate::schema::catalog::{
    player_game_partition, player_game_schema, CATCHER_STATS, FIELDING_POSITIONS, FIELDING_STATS,
    PLAYER_GAME_KEYS,
};
use crate::table::Table;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Stat column that is a flag and must not be summed.
const GAME_FLAG: &str = "b_g";

/// Share of rows on which `appear_dt` must equal `game_dt` for it to be
/// dropped.
pub const REDUNDANT_APPEAR_SHARE: f64 = 0.999;

/// The role tables of one player-game dataset.
#[derive(Debug, Clone)]
pub struct PlayerGameTables {
    /// Keys and `game_dt`, plus `appear_dt` when it carries information.
    pub appearance: Table,
    pub batting: Table,
    pub pitching: Table,
    pub fielding: Table,
}

/// Merge rows sharing `(game_id, player_id)` by summing their stats.
///
/// The first row's identifiers and `b_g` are kept. Row order is that of
/// each key's first occurrence.
pub fn merge_duplicate_players(table: &Table) -> Result<Table, SchemaError> {
    let game = table.require_column("game_id")?;
    let player = table.require_column("player_id")?;
    let stat_cols: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| is_stat(c) && c.as_str() != GAME_FLAG)
        .map(|(i, _)| i)
        .collect();

    let mut merged = Table::new(table.name(), table.columns().to_vec())?;
    let mut seen: FxHashMap<(String, String), usize> = FxHashMap::default();
    let mut repaired: Vec<String> = Vec::new();

    for (i, row) in table.rows().iter().enumerate() {
        let key = (row[game].clone(), row[player].clone());
        match seen.get(&key) {
            None => {
                seen.insert(key, merged.len());
                merged.push_row(row.clone())?;
            }
            Some(&target) => {
                for &col in &stat_cols {
                    let sum = count(&merged, target, col)? + count(table, i, col)?;
                    merged.rows_mut()[target][col] = sum.to_string();
                }
                repaired.push(format!("{}/{}", key.0, key.1));
            }
        }
    }

    if !repaired.is_empty() {
        warn!(
            dataset = %table.name(),
            keys = ?repaired,
            "duplicate player-game keys; stats summed"
        );
    }
    Ok(merged)
}

fn is_stat(column: &str) -> bool {
    column.starts_with("b_") || column.starts_with("p_") || column.starts_with("f_")
}

/// Split a raw player_game table into tidy role tables.
pub fn wrangle_player_game(raw: &Table) -> Result<PlayerGameTables, SchemaError> {
    let conformed = player_game_schema().conform(raw)?;
    let cleaned = merge_duplicate_players(&conformed)?;

    let mut groups = player_game_partition().split(&cleaned)?.into_iter();
    let (Some(appearance), Some(batting), Some(pitching), Some(fielding)) =
        (groups.next(), groups.next(), groups.next(), groups.next())
    else {
        return Err(SchemaError::MissingColumns {
            dataset: cleaned.name().to_string(),
            columns: vec!["appearance/batting/pitching/fielding groups".to_string()],
        });
    };

    let appearance = drop_redundant_appear_dt(appearance)?;
    let batting = tidy_batting(batting)?;
    let pitching = tidy_pitching(pitching)?;
    let fielding = tidy_fielding(&fielding)?;

    info!(
        batting = batting.len(),
        pitching = pitching.len(),
        fielding = fielding.len(),
        "player_game wrangled"
    );
    Ok(PlayerGameTables {
        appearance,
        batting,
        pitching,
        fielding,
    })
}

/// Drop `appear_dt` when it repeats `game_dt` on nearly every row.
pub fn drop_redundant_appear_dt(mut table: Table) -> Result<Table, SchemaError> {
    let game_dt = table.require_column("game_dt")?;
    let appear_dt = table.require_column("appear_dt")?;
    let same = table
        .rows()
        .iter()
        .filter(|row| row[game_dt].trim() == row[appear_dt].trim())
        .count();

    if table.is_empty() || same as f64 / table.len() as f64 > REDUNDANT_APPEAR_SHARE {
        table.drop_columns(&["appear_dt"])?;
        debug!(dataset = %table.name(), "appear_dt repeats game_dt; dropped");
    } else {
        warn!(
            dataset = %table.name(),
            differing = table.len() - same,
            rows = table.len(),
            "appear_dt differs from game_dt; kept"
        );
    }
    Ok(table)
}

fn tidy_batting(mut batting: Table) -> Result<Table, SchemaError> {
    batting.rename_columns(|c| strip_prefix_renamed(c, "b_", &[("2b", "double"), ("3b", "triple")]))?;
    Ok(batting)
}

/// Keep players with any non-zero pitching stat.
fn tidy_pitching(mut pitching: Table) -> Result<Table, SchemaError> {
    let stat_cols: Vec<usize> = (PLAYER_GAME_KEYS.len()..pitching.columns().len()).collect();
    let keep = nonzero_rows(&pitching, &stat_cols)?;
    let mut row = 0;
    pitching.retain_rows(|_| {
        let k = keep[row];
        row += 1;
        k
    });
    pitching.rename_columns(|c| {
        strip_prefix_renamed(
            c,
            "p_",
            &[("2b", "double"), ("3b", "triple"), ("gdp", "gidp"), ("hp", "hbp")],
        )
    })?;
    Ok(pitching)
}

fn nonzero_rows(table: &Table, cols: &[usize]) -> Result<Vec<bool>, SchemaError> {
    (0..table.len())
        .map(|row| {
            for &col in cols {
                if count(table, row, col)? != 0 {
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .collect()
}

/// Tidy fielding header: keys, `pos`, then the per-position stats.
pub fn fielding_header() -> Vec<String> {
    let mut cols: Vec<String> = ["game_id", "player_id", "pos", "team_id"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    cols.extend(FIELDING_STATS.iter().map(|s| fielding_stat_name(s).to_string()));
    cols.extend(CATCHER_STATS.iter().map(|s| s.to_string()));
    cols
}

fn fielding_stat_name(stat: &str) -> &str {
    if stat == "out" {
        "inn_outs"
    } else {
        stat
    }
}

/// One row per player and position played, grouped by position.
fn tidy_fielding(wide: &Table) -> Result<Table, SchemaError> {
    let game = wide.require_column("game_id")?;
    let player = wide.require_column("player_id")?;
    let team = wide.require_column("team_id")?;
    let mut fielding = Table::new("fielding", fielding_header())?;

    for pos in FIELDING_POSITIONS {
        let mut stats: Vec<&str> = FIELDING_STATS.to_vec();
        if *pos == "c" {
            stats.extend(CATCHER_STATS);
        }
        let cols = stats
            .iter()
            .map(|s| wide.require_column(&format!("f_{}_{}", pos, s)))
            .collect::<Result<Vec<_>, _>>()?;
        let played = nonzero_rows(wide, &cols)?;

        for (row_idx, row) in wide.rows().iter().enumerate() {
            if !played[row_idx] {
                continue;
            }
            let mut out = vec![
                row[game].clone(),
                row[player].clone(),
                pos.to_uppercase(),
                row[team].clone(),
            ];
            out.extend(cols.iter().map(|&c| row[c].clone()));
            if *pos != "c" {
                out.extend(CATCHER_STATS.iter().map(|_| "0".to_string()));
            }
            fielding.push_row(out)?;
        }
    }
    Ok(fielding)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::catalog::player_game_schema;

    /// A declared-schema player_game row; unspecified stats are 0.
    pub(crate) fn player_row(game: &str, player: &str, team: &str, stats: &[(&str, &str)]) -> Vec<String> {
        player_game_schema()
            .columns()
            .iter()
            .map(|c| match c.as_str() {
                "game_id" => game.to_string(),
                "player_id" => player.to_string(),
                "team_id" => team.to_string(),
                "game_dt" | "appear_dt" => stats
                    .iter()
                    .find(|(name, _)| *name == c.as_str())
                    .map_or_else(|| game[3..11].to_string(), |(_, v)| v.to_string()),
                other => stats
                    .iter()
                    .find(|(name, _)| *name == other)
                    .map_or_else(|| "0".to_string(), |(_, v)| v.to_string()),
            })
            .collect()
    }

    pub(crate) fn player_table(rows: Vec<Vec<String>>) -> Table {
        Table::from_rows("player_game", player_game_schema().columns().to_vec(), rows).unwrap()
    }

    #[test]
    fn test_duplicates_summed_except_game_flag() {
        let t = player_table(vec![
            player_row("BOS201904010", "smitj001", "BOS", &[("b_g", "1"), ("b_h", "1"), ("b_ab", "2")]),
            player_row("BOS201904010", "jonep001", "BOS", &[("b_g", "1"), ("b_h", "2")]),
            player_row("BOS201904010", "smitj001", "BOS", &[("b_g", "1"), ("b_h", "1"), ("b_ab", "1")]),
        ]);
        let merged = merge_duplicate_players(&t).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(0, "player_id"), Some("smitj001"));
        assert_eq!(merged.get(0, "b_h"), Some("2"));
        assert_eq!(merged.get(0, "b_ab"), Some("3"));
        assert_eq!(merged.get(0, "b_g"), Some("1"));
        assert_eq!(merged.get(1, "b_h"), Some("2"));
    }

    #[test]
    fn test_batting_every_row_renamed() {
        let t = player_table(vec![
            player_row("BOS201904010", "smitj001", "BOS", &[("b_2b", "1"), ("b_3b", "1")]),
            player_row("BOS201904010", "pitcp001", "BOS", &[("p_so", "5")]),
        ]);
        let out = wrangle_player_game(&t).unwrap();
        let b = &out.batting;
        assert_eq!(b.len(), 2);
        assert_eq!(&b.columns()[..4], &["game_id", "player_id", "team_id", "g"]);
        assert!(b.has_column("double") && b.has_column("triple") && b.has_column("gdp"));
        assert_eq!(b.get(0, "double"), Some("1"));
    }

    #[test]
    fn test_pitching_only_pitchers() {
        let t = player_table(vec![
            player_row("BOS201904010", "smitj001", "BOS", &[("b_h", "1")]),
            player_row("BOS201904010", "pitcp001", "BOS", &[("p_so", "5"), ("p_gdp", "1")]),
        ]);
        let p = wrangle_player_game(&t).unwrap().pitching;
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(0, "player_id"), Some("pitcp001"));
        assert_eq!(p.get(0, "gidp"), Some("1"));
        assert!(p.has_column("hbp") && p.has_column("double") && !p.has_column("gdp"));
    }

    #[test]
    fn test_fielding_melted_by_position() {
        let t = player_table(vec![
            player_row(
                "BOS201904010",
                "catcc001",
                "BOS",
                &[("f_c_g", "1"), ("f_c_po", "8"), ("f_c_pb", "1"), ("f_1b_g", "1"), ("f_1b_po", "2")],
            ),
            player_row("BOS201904010", "smitj001", "BOS", &[("b_h", "1")]),
        ]);
        let f = wrangle_player_game(&t).unwrap().fielding;
        assert_eq!(f.columns(), fielding_header().as_slice());
        assert!(f.has_column("inn_outs"));
        assert_eq!(f.len(), 2);

        assert_eq!(f.get(0, "pos"), Some("C"));
        assert_eq!(f.get(0, "po"), Some("8"));
        assert_eq!(f.get(0, "pb"), Some("1"));
        assert_eq!(f.get(1, "pos"), Some("1B"));
        assert_eq!(f.get(1, "po"), Some("2"));
        assert_eq!(f.get(1, "pb"), Some("0"));
        assert_eq!(f.get(1, "xi"), Some("0"));
    }

    #[test]
    fn test_non_numeric_stat_is_error() {
        let t = player_table(vec![player_row("BOS201904010", "x", "BOS", &[("p_so", "lots")])]);
        assert!(matches!(
            wrangle_player_game(&t),
            Err(SchemaError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_redundant_appear_dt_dropped() {
        let t = player_table(vec![
            player_row("BOS201904010", "smitj001", "BOS", &[("b_h", "1")]),
            player_row("BOS201904010", "jonep001", "BOS", &[("b_h", "2")]),
        ]);
        let a = wrangle_player_game(&t).unwrap().appearance;
        assert_eq!(a.columns(), &["game_id", "player_id", "team_id", "game_dt"]);
        assert_eq!(a.get(1, "game_dt"), Some("20190401"));
    }

    #[test]
    fn test_distinct_appear_dt_kept() {
        let t = player_table(vec![
            player_row("BOS201904010", "smitj001", "BOS", &[]),
            player_row("BOS201904010", "jonep001", "BOS", &[("appear_dt", "20190402")]),
        ]);
        let a = wrangle_player_game(&t).unwrap().appearance;
        assert!(a.has_column("appear_dt"));
        assert_eq!(a.get(1, "appear_dt"), Some("20190402"));
    }

    #[test]
    fn test_dates_are_not_batting_stats() {
        let t = player_table(vec![player_row("BOS201904010", "smitj001", "BOS", &[("b_h", "1")])]);
        let out = wrangle_player_game(&t).unwrap();
        assert!(!out.batting.has_column("game_dt"));
        assert!(!out.batting.has_column("appear_dt"));
    }
}
