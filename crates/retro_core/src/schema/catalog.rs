//! Declared input schemas of the external parser outputs.
//!
//! These lists are the contract with the parser; an input whose header
//! differs from its declaration is rejected before any processing.

use super::projection::{ColumnGroup, Projection};
use super::Schema;

pub const SCHEMA_VERSION: &str = "v1";

pub const PLAYER_GAME: &str = "player_game";
pub const GAME: &str = "game";
pub const EVENT: &str = "event";

pub const PLAYER_GAME_KEYS: [&str; 3] = ["game_id", "player_id", "team_id"];

/// Game date and the player's appearance date.
pub const PLAYER_GAME_DATES: &[&str] = &["game_dt", "appear_dt"];

pub const BATTING_STATS: &[&str] = &[
    "g", "pa", "ab", "r", "h", "tb", "2b", "3b", "hr", "hr4", "rbi", "gw", "bb", "ibb", "so",
    "gdp", "hp", "sh", "sf", "sb", "cs", "xi", "g_dh", "g_ph", "g_pr",
];

pub const PITCHING_STATS: &[&str] = &[
    "g", "gs", "cg", "sho", "gf", "w", "l", "sv", "out", "tbf", "ab", "r", "er", "h", "tb",
    "2b", "3b", "hr", "hr4", "bb", "ibb", "so", "gdp", "hp", "sh", "sf", "xi", "wp", "bk", "ir",
    "irs", "go", "ao", "pitch", "strike",
];

pub const FIELDING_POSITIONS: &[&str] = &["p", "c", "1b", "2b", "3b", "ss", "lf", "cf", "rf"];

pub const FIELDING_STATS: &[&str] = &["g", "gs", "out", "tc", "po", "a", "e", "dp", "tp"];

/// Catcher-only fielding stats.
pub const CATCHER_STATS: &[&str] = &["pb", "xi"];

pub const GAME_KEYS: [&str; 1] = ["game_id"];

/// Game attributes without a team dimension.
pub const GAME_FIELDS: &[&str] = &[
    "game_dt", "game_ct", "game_dy", "start_game_tm", "dh_fl", "daynight_park_cd", "park_id",
    "attend_park_ct", "minutes_game_ct", "temp_park_ct", "wind_direction_park_cd",
    "wind_speed_park_ct", "field_park_cd", "precip_park_cd", "sky_park_cd", "inn_ct",
    "win_pit_id", "lose_pit_id", "save_pit_id",
];

/// Per-team game columns, present once with `away_` and once with `home_`.
pub const TEAM_GAME_FIELDS: &[&str] = &[
    "team_id", "team_league_id", "start_pit_id", "score_ct", "hits_ct", "err_ct", "lob_ct",
    "ab_ct", "2b_ct", "3b_ct", "hr_ct", "bi_ct", "sh_ct", "sf_ct", "hp_ct", "bb_ct", "ibb_ct",
    "so_ct", "sb_ct", "cs_ct", "gdp_ct", "xi_ct", "pitcher_ct", "er_ct", "ter_ct", "wp_ct",
    "bk_ct", "po_ct", "a_ct", "pb_ct", "dp_ct", "tp_ct",
];

pub const EVENT_KEYS: [&str; 2] = ["game_id", "event_id"];

pub const EVENT_FIELDS: &[&str] = &[
    "game_id", "away_team_id", "inn_ct", "bat_home_id", "outs_ct", "balls_ct", "strikes_ct",
    "pitch_seq_tx", "away_score_ct", "home_score_ct", "bat_id", "bat_hand_cd", "resp_bat_id",
    "resp_bat_hand_cd", "pit_id", "pit_hand_cd", "resp_pit_id", "resp_pit_hand_cd",
    "pos2_fld_id", "pos3_fld_id", "pos4_fld_id", "pos5_fld_id", "pos6_fld_id", "pos7_fld_id",
    "pos8_fld_id", "pos9_fld_id", "base1_run_id", "base2_run_id", "base3_run_id", "event_tx",
    "leadoff_fl", "ph_fl", "bat_fld_cd", "bat_lineup_id", "event_cd", "bat_event_fl", "ab_fl",
    "h_cd", "sh_fl", "sf_fl", "event_outs_ct", "dp_fl", "tp_fl", "rbi_ct", "wp_fl", "pb_fl",
    "fld_cd", "battedball_cd", "bunt_fl", "foul_fl", "battedball_loc_tx", "err_ct",
    "bat_dest_id", "run1_dest_id", "run2_dest_id", "run3_dest_id", "event_id", "home_team_id",
    "bat_team_id", "fld_team_id", "inn_end_fl", "start_bat_score_ct", "start_fld_score_ct",
    "inn_runs_ct", "game_pa_ct", "inn_pa_ct", "pa_new_fl", "pa_trunc_fl",
];

/// Curated subset written when no field selection is configured.
pub const EVENT_DEFAULT_FIELDS: &[&str] = &[
    "game_id", "event_id", "bat_team_id", "fld_team_id", "inn_ct", "bat_home_id", "outs_ct",
    "balls_ct", "strikes_ct", "bat_id", "pit_id", "event_tx", "event_cd", "h_cd", "ab_fl",
    "rbi_ct", "event_outs_ct", "bat_dest_id", "run1_dest_id", "run2_dest_id", "run3_dest_id",
];

/// Event columns the decoder and aggregator read regardless of selection.
pub const EVENT_REQUIRED: &[&str] = &["game_id", "event_id", "bat_team_id", "fld_team_id", "event_tx"];

fn prefixed(prefix: &str, names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("{}{}", prefix, n)).collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn batting_columns() -> Vec<String> {
    prefixed("b_", BATTING_STATS)
}

pub fn pitching_columns() -> Vec<String> {
    prefixed("p_", PITCHING_STATS)
}

/// `f_{pos}_{stat}` for every position, catcher extras after the
/// catcher's common stats.
pub fn fielding_columns() -> Vec<String> {
    let mut cols = Vec::new();
    for pos in FIELDING_POSITIONS {
        cols.extend(prefixed(&format!("f_{}_", pos), FIELDING_STATS));
        if *pos == "c" {
            cols.extend(prefixed("f_c_", CATCHER_STATS));
        }
    }
    cols
}

pub fn player_game_schema() -> Schema {
    let mut columns = owned(&PLAYER_GAME_KEYS);
    columns.extend(owned(PLAYER_GAME_DATES));
    columns.extend(batting_columns());
    columns.extend(pitching_columns());
    columns.extend(fielding_columns());
    Schema::new(PLAYER_GAME, owned(&PLAYER_GAME_KEYS), columns)
}

pub fn game_schema() -> Schema {
    let mut columns = owned(&GAME_KEYS);
    columns.extend(owned(GAME_FIELDS));
    columns.extend(prefixed("away_", TEAM_GAME_FIELDS));
    columns.extend(prefixed("home_", TEAM_GAME_FIELDS));
    Schema::new(GAME, owned(&GAME_KEYS), columns)
}

pub fn event_schema() -> Schema {
    Schema::new(EVENT, owned(&EVENT_KEYS), owned(EVENT_FIELDS))
}

/// player_game → appearance / batting / pitching / fielding.
pub fn player_game_partition() -> Projection {
    Projection::new(
        PLAYER_GAME,
        owned(&PLAYER_GAME_KEYS),
        vec![
            ColumnGroup::new("appearance", owned(PLAYER_GAME_DATES)),
            ColumnGroup::new("batting", batting_columns()),
            ColumnGroup::new("pitching", pitching_columns()),
            ColumnGroup::new("fielding", fielding_columns()),
        ],
    )
}

/// game → game-only attributes / home team / away team.
pub fn game_partition() -> Projection {
    Projection::new(
        GAME,
        owned(&GAME_KEYS),
        vec![
            ColumnGroup::new("game", owned(GAME_FIELDS)),
            ColumnGroup::new("home", prefixed("home_", TEAM_GAME_FIELDS)),
            ColumnGroup::new("away", prefixed("away_", TEAM_GAME_FIELDS)),
        ],
    )
}
