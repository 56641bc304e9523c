//! game → game, team_game.

use super::count;
use crate::error::SchemaError;
use crate::schema::catalog::{game_partition, game_schema};
use crate::table::Table;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

/// Format of the `game_start_dt` column.
pub const START_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Game-level and team-level tables of one game dataset.
#[derive(Debug, Clone)]
pub struct GameTables {
    pub game: Table,
    pub team_game: Table,
}

/// Start of a game from its `YYYYMMDD` date, `hmm` clock time and
/// day/night code.
///
/// The clock time has no AM/PM: games never start before 9 so any time
/// in `(0, 900)` is afternoon, and `[900, 1200)` is evening only for a
/// night game. A time of 0 is unknown and maps to midnight.
pub fn game_start(date: &str, time: i64, daynight: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y%m%d").ok()?;
    if time < 0 {
        return None;
    }
    let night = daynight.trim() == "N";
    let hhmm = if (1..900).contains(&time) || ((900..1200).contains(&time) && night) {
        time + 1200
    } else {
        time
    };
    let clock = NaiveTime::from_hms_opt(u32::try_from(hhmm / 100).ok()?, u32::try_from(hhmm % 100).ok()?, 0)?;
    Some(date.and_time(clock))
}

/// Split a raw game table into `game` and stacked `team_game`.
pub fn wrangle_game(raw: &Table) -> Result<GameTables, SchemaError> {
    let conformed = game_schema().conform(raw)?;
    let mut groups = game_partition().split(&conformed)?.into_iter();
    let (Some(game), Some(home), Some(away)) = (groups.next(), groups.next(), groups.next()) else {
        return Err(SchemaError::MissingColumns {
            dataset: conformed.name().to_string(),
            columns: vec!["game/home/away groups".to_string()],
        });
    };

    let team_game = stack_team_games(home, away)?;
    let game = tidy_game(game)?;

    info!(games = game.len(), team_games = team_game.len(), "game wrangled");
    Ok(GameTables { game, team_game })
}

fn stack_team_games(mut home: Table, mut away: Table) -> Result<Table, SchemaError> {
    let home_teams = team_ids(&home, "home_team_id")?;
    let away_teams = team_ids(&away, "away_team_id")?;

    for (table, prefix, at_home, opponents) in [
        (&mut home, "home_", "true", &away_teams),
        (&mut away, "away_", "false", &home_teams),
    ] {
        table.rename_columns(|c| c.strip_prefix(prefix).map(str::to_string))?;
        table.insert_column(1, "at_home", |_| at_home.to_string())?;
        let mut opponent = opponents.iter();
        table.insert_column(4, "opponent_team_id", |_| {
            opponent.next().cloned().unwrap_or_default()
        })?;
        table.rename_columns(team_game_name)?;
    }

    let mut team_game = Table::new("team_game", home.columns().to_vec())?;
    team_game.extend(home)?;
    team_game.extend(away)?;
    append_singles(&mut team_game)?;
    Ok(team_game)
}

fn team_ids(table: &Table, column: &str) -> Result<Vec<String>, SchemaError> {
    let col = table.require_column(column)?;
    Ok(table.rows().iter().map(|r| r[col].clone()).collect())
}

/// `_ct` dropped and names aligned with the player tables.
fn team_game_name(column: &str) -> Option<String> {
    let renamed = match column {
        "pitcher_ct" => return None,
        "2b_ct" => "double",
        "3b_ct" => "triple",
        "bi_ct" => "rbi",
        "gdp_ct" => "gidp",
        "hits_ct" => "h",
        "hp_ct" => "hbp",
        "err_ct" => "e",
        "score_ct" => "r",
        other => other.strip_suffix("_ct")?,
    };
    Some(renamed.to_string())
}

/// `single = h - double - triple - hr`.
fn append_singles(team_game: &mut Table) -> Result<(), SchemaError> {
    let [h, double, triple, hr] = ["h", "double", "triple", "hr"].map(|c| team_game.require_column(c));
    let (h, double, triple, hr) = (h?, double?, triple?, hr?);
    let singles = (0..team_game.len())
        .map(|row| {
            Ok(count(team_game, row, h)?
                - count(team_game, row, double)?
                - count(team_game, row, triple)?
                - count(team_game, row, hr)?)
        })
        .collect::<Result<Vec<i64>, SchemaError>>()?;
    let mut singles = singles.into_iter();
    team_game.push_column("single", |_| {
        singles.next().map(|s| s.to_string()).unwrap_or_default()
    })
}

fn tidy_game(mut game: Table) -> Result<Table, SchemaError> {
    let date = game.require_column("game_dt")?;
    let time = game.require_column("start_game_tm")?;
    let daynight = game.require_column("daynight_park_cd")?;

    let starts = (0..game.len())
        .map(|row| {
            let minutes = count(&game, row, time)?;
            let cells = &game.rows()[row];
            game_start(&cells[date], minutes, &cells[daynight])
                .map(|dt| dt.format(START_FORMAT).to_string())
                .ok_or_else(|| {
                    let bad = if NaiveDate::parse_from_str(cells[date].trim(), "%Y%m%d").is_err() {
                        date
                    } else {
                        time
                    };
                    SchemaError::InvalidNumber {
                        dataset: game.name().to_string(),
                        row: row + 1,
                        column: game.columns()[bad].clone(),
                        value: cells[bad].clone(),
                    }
                })
        })
        .collect::<Result<Vec<String>, SchemaError>>()?;

    let mut starts = starts.into_iter();
    game.insert_column(1, "game_start_dt", |_| starts.next().unwrap_or_default())?;

    let dh = game.require_column("dh_fl")?;
    game.push_column("dh_flag", |row| (row[dh].trim() == "T").to_string())?;
    game.drop_columns(&["start_game_tm", "game_dt", "game_dy", "dh_fl"])?;
    Ok(game)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::catalog::game_schema;

    /// A declared-schema game row; unspecified team stats are 0 and
    /// other attributes blank.
    pub(crate) fn game_row(game: &str, away: &str, home: &str, values: &[(&str, &str)]) -> Vec<String> {
        game_schema()
            .columns()
            .iter()
            .map(|c| {
                if let Some((_, v)) = values.iter().find(|(name, _)| *name == c.as_str()) {
                    return v.to_string();
                }
                match c.as_str() {
                    "game_id" => game.to_string(),
                    "away_team_id" => away.to_string(),
                    "home_team_id" => home.to_string(),
                    "game_dt" => game[3..11].to_string(),
                    "start_game_tm" => "105".to_string(),
                    "daynight_park_cd" => "D".to_string(),
                    "dh_fl" => "F".to_string(),
                    c if c.ends_with("_ct") && (c.starts_with("home_") || c.starts_with("away_")) => {
                        "0".to_string()
                    }
                    _ => String::new(),
                }
            })
            .collect()
    }

    pub(crate) fn game_table(rows: Vec<Vec<String>>) -> Table {
        Table::from_rows("game", game_schema().columns().to_vec(), rows).unwrap()
    }

    fn at(date: &str, hms: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, hms), "%Y%m%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_game_start_am_pm() {
        assert_eq!(game_start("20190401", 105, "D"), Some(at("20190401", "13:05:00")));
        assert_eq!(game_start("20190401", 705, "N"), Some(at("20190401", "19:05:00")));
        assert_eq!(game_start("20190401", 1035, "D"), Some(at("20190401", "10:35:00")));
        assert_eq!(game_start("20190401", 1035, "N"), Some(at("20190401", "22:35:00")));
        assert_eq!(game_start("20190401", 1205, "D"), Some(at("20190401", "12:05:00")));
        assert_eq!(game_start("20190401", 0, "N"), Some(at("20190401", "00:00:00")));
        assert_eq!(game_start("2019-04-01", 105, "D"), None);
        assert_eq!(game_start("20190401", 975, "D"), None);
    }

    #[test]
    fn test_team_game_stacks_home_then_away() {
        let t = game_table(vec![game_row(
            "BOS201904010",
            "NYA",
            "BOS",
            &[
                ("home_score_ct", "5"),
                ("away_score_ct", "3"),
                ("home_hits_ct", "9"),
                ("home_2b_ct", "2"),
                ("home_3b_ct", "1"),
                ("home_hr_ct", "1"),
                ("home_pitcher_ct", "4"),
            ],
        )]);
        let tg = wrangle_game(&t).unwrap().team_game;
        assert_eq!(tg.len(), 2);
        assert_eq!(
            &tg.columns()[..5],
            &["game_id", "at_home", "team_id", "team_league_id", "opponent_team_id"]
        );
        assert_eq!(tg.columns().last().map(String::as_str), Some("single"));
        for name in ["r", "h", "e", "double", "triple", "rbi", "gidp", "hbp", "pitcher_ct", "lob"] {
            assert!(tg.has_column(name), "missing {}", name);
        }

        assert_eq!(tg.get(0, "team_id"), Some("BOS"));
        assert_eq!(tg.get(0, "at_home"), Some("true"));
        assert_eq!(tg.get(0, "opponent_team_id"), Some("NYA"));
        assert_eq!(tg.get(0, "r"), Some("5"));
        assert_eq!(tg.get(0, "single"), Some("5"));
        assert_eq!(tg.get(0, "pitcher_ct"), Some("4"));
        assert_eq!(tg.get(1, "team_id"), Some("NYA"));
        assert_eq!(tg.get(1, "at_home"), Some("false"));
        assert_eq!(tg.get(1, "opponent_team_id"), Some("BOS"));
        assert_eq!(tg.get(1, "r"), Some("3"));
    }

    #[test]
    fn test_game_tidy_columns() {
        let t = game_table(vec![game_row(
            "BOS201904010",
            "NYA",
            "BOS",
            &[("dh_fl", "T"), ("start_game_tm", "710"), ("daynight_park_cd", "N")],
        )]);
        let g = wrangle_game(&t).unwrap().game;
        assert_eq!(&g.columns()[..2], &["game_id", "game_start_dt"]);
        assert_eq!(g.get(0, "game_start_dt"), Some("2019-04-01 19:10:00"));
        assert_eq!(g.get(0, "dh_flag"), Some("true"));
        for dropped in ["start_game_tm", "game_dt", "game_dy", "dh_fl"] {
            assert!(!g.has_column(dropped));
        }
        assert!(!g.has_column("home_team_id"));
    }

    #[test]
    fn test_bad_date_is_error() {
        let t = game_table(vec![game_row("BOS201904010", "NYA", "BOS", &[("game_dt", "April")])]);
        assert!(matches!(
            wrangle_game(&t),
            Err(SchemaError::InvalidNumber { row: 1, ref column, .. }) if column == "game_dt"
        ));
    }

    #[test]
    fn test_bad_start_time_names_time_column() {
        let t = game_table(vec![game_row("BOS201904010", "NYA", "BOS", &[("start_game_tm", "975")])]);
        match wrangle_game(&t) {
            Err(SchemaError::InvalidNumber { column, value, .. }) => {
                assert_eq!(column, "start_game_tm");
                assert_eq!(value, "975");
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }
}
