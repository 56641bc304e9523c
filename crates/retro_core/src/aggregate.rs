//! # Aggregator
//!
//! Rolls rows up to game, team-season and league-season level by
//! summing integer stat columns over a declared group key.
//!
//! Keys are projections of identifier columns that already exist in the
//! dataset; nothing is inferred. A row whose key cannot be built is an
//! error, never skipped: a missing key means the datasets disagree about
//! identity and any later comparison would be meaningless.

use crate::error::SchemaError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// League assigned to every team when no league map is supplied.
pub const DEFAULT_LEAGUE: &str = "MLB";

/// One component of a group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    /// Value of `source`, reported as `name`.
    Column { name: String, source: String },
    /// Season year taken from a game id in `source`.
    Season { name: String, source: String },
    /// League of the team in `team`, for the season of the game id in
    /// `season`.
    League {
        name: String,
        season: String,
        team: String,
    },
}

impl KeyPart {
    pub fn column(name: &str, source: &str) -> Self {
        KeyPart::Column {
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    pub fn season(source: &str) -> Self {
        KeyPart::Season {
            name: "year".to_string(),
            source: source.to_string(),
        }
    }

    pub fn league(season: &str, team: &str) -> Self {
        KeyPart::League {
            name: "lg_id".to_string(),
            season: season.to_string(),
            team: team.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            KeyPart::Column { name, .. }
            | KeyPart::Season { name, .. }
            | KeyPart::League { name, .. } => name,
        }
    }
}

/// Declared projection from a row to its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    parts: Vec<KeyPart>,
}

impl GroupKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    pub fn names(&self) -> Vec<String> {
        self.parts.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }
}

/// Granularity of a rollup for datasets keyed by game id and team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationLevel {
    Game,
    TeamSeason,
    LeagueSeason,
}

impl AggregationLevel {
    /// Group key for a dataset whose game id is `game_id` and whose team
    /// is in `team_column`.
    pub fn key(&self, team_column: &str) -> GroupKey {
        match self {
            AggregationLevel::Game => GroupKey::new(vec![
                KeyPart::column("game_id", "game_id"),
                KeyPart::column("team_id", team_column),
            ]),
            AggregationLevel::TeamSeason => GroupKey::new(vec![
                KeyPart::season("game_id"),
                KeyPart::column("team_id", team_column),
            ]),
            AggregationLevel::LeagueSeason => GroupKey::new(vec![
                KeyPart::season("game_id"),
                KeyPart::league("game_id", team_column),
            ]),
        }
    }
}

/// Season year from a Retrosheet game id: `BOS201904010` → `2019`.
pub fn season_of(game_id: &str) -> Option<&str> {
    if game_id.len() != 12 || !game_id.is_ascii() {
        return None;
    }
    let year = &game_id[3..7];
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}

/// `(season, team) → league`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueMap {
    leagues: BTreeMap<(String, String), String>,
}

impl LeagueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, season: &str, team: &str, league: &str) {
        self.leagues
            .insert((season.to_string(), team.to_string()), league.to_string());
    }

    pub fn get(&self, season: &str, team: &str) -> Option<&str> {
        self.leagues
            .get(&(season.to_string(), team.to_string()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    /// Collect team leagues from a table with game id, team and league
    /// columns. Rows with a blank league are ignored.
    pub fn from_table(
        table: &Table,
        game_column: &str,
        team_column: &str,
        league_column: &str,
    ) -> Result<Self, SchemaError> {
        let game = table.require_column(game_column)?;
        let team = table.require_column(team_column)?;
        let league = table.require_column(league_column)?;
        let mut map = Self::new();
        for (i, row) in table.rows().iter().enumerate() {
            if row[league].trim().is_empty() {
                continue;
            }
            let season = season_of(&row[game]).ok_or_else(|| SchemaError::InvalidKey {
                dataset: table.name().to_string(),
                row: i + 1,
                column: game_column.to_string(),
                value: row[game].clone(),
            })?;
            map.insert(season, &row[team], &row[league]);
        }
        Ok(map)
    }

    /// Collect team leagues from a table keyed by season year.
    pub fn from_season_table(
        table: &Table,
        year_column: &str,
        team_column: &str,
        league_column: &str,
    ) -> Result<Self, SchemaError> {
        let year = table.require_column(year_column)?;
        let team = table.require_column(team_column)?;
        let league = table.require_column(league_column)?;
        let mut map = Self::new();
        for row in table.rows() {
            if !row[league].trim().is_empty() {
                map.insert(row[year].trim(), row[team].trim(), row[league].trim());
            }
        }
        Ok(map)
    }
}

/// Summed stats for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub key: Vec<String>,
    pub values: BTreeMap<String, i64>,
}

impl AggregateRecord {
    pub fn get(&self, stat: &str) -> Option<i64> {
        self.values.get(stat).copied()
    }
}

/// All records of one rollup, ordered by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSet {
    pub source: String,
    pub key_names: Vec<String>,
    pub records: BTreeMap<Vec<String>, AggregateRecord>,
}

impl AggregateSet {
    pub fn new(source: &str, key_names: Vec<String>) -> Self {
        Self {
            source: source.to_string(),
            key_names,
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[String]) -> Option<&AggregateRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add `value` to `stat` of `key`, creating the record if needed.
    pub fn add(&mut self, key: Vec<String>, stat: &str, value: i64) {
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| AggregateRecord {
                key,
                values: BTreeMap::new(),
            });
        *record.values.entry(stat.to_string()).or_insert(0) += value;
    }

    /// Give every record each of `stats`, at 0 where absent.
    pub fn fill_missing(&mut self, stats: &[&str]) {
        for record in self.records.values_mut() {
            for stat in stats {
                record.values.entry(stat.to_string()).or_insert(0);
            }
        }
    }

    /// Fold `other`'s records into this set. Both sides must use the
    /// same key names; stats present on both sides are added.
    pub fn merge(&mut self, other: AggregateSet) -> Result<(), SchemaError> {
        if other.key_names != self.key_names {
            return Err(SchemaError::MissingColumns {
                dataset: other.source,
                columns: self.key_names.clone(),
            });
        }
        for (key, record) in other.records {
            for (stat, value) in record.values {
                self.add(key.clone(), &stat, value);
            }
        }
        Ok(())
    }
}

/// Sums stat columns over group keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator<'a> {
    leagues: Option<&'a LeagueMap>,
}

impl<'a> Aggregator<'a> {
    pub fn new() -> Self {
        Self { leagues: None }
    }

    /// Resolve `League` key parts through `leagues`.
    pub fn with_leagues(leagues: &'a LeagueMap) -> Self {
        Self {
            leagues: Some(leagues),
        }
    }

    /// One record per distinct key value of `table`, each stat summed
    /// over the rows sharing that key.
    pub fn aggregate(
        &self,
        table: &Table,
        key: &GroupKey,
        stats: &[String],
    ) -> Result<AggregateSet, SchemaError> {
        let stat_cols = stats
            .iter()
            .map(|s| table.require_column(s))
            .collect::<Result<Vec<_>, _>>()?;

        let resolved = key
            .parts()
            .iter()
            .map(|part| self.resolve_part(table, part))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = AggregateSet::new(table.name(), key.names());
        for row_idx in 0..table.len() {
            let key_values = resolved
                .iter()
                .map(|part| part.value(table, row_idx, self.leagues))
                .collect::<Result<Vec<_>, _>>()?;

            for (stat, &col) in stats.iter().zip(&stat_cols) {
                let value = table.int_at(row_idx, col)?;
                set.add(key_values.clone(), stat, value);
            }
            if stats.is_empty() {
                set.records
                    .entry(key_values.clone())
                    .or_insert_with(|| AggregateRecord {
                        key: key_values,
                        values: BTreeMap::new(),
                    });
            }
        }

        debug!(
            source = %table.name(),
            keys = ?key.names(),
            rows = table.len(),
            records = set.len(),
            "aggregated"
        );
        Ok(set)
    }

    fn resolve_part<'k>(
        &self,
        table: &Table,
        part: &'k KeyPart,
    ) -> Result<ResolvedPart<'k>, SchemaError> {
        Ok(match part {
            KeyPart::Column { source, .. } => ResolvedPart::Column {
                col: table.require_column(source)?,
                source,
            },
            KeyPart::Season { source, .. } => ResolvedPart::Season {
                col: table.require_column(source)?,
                source,
            },
            KeyPart::League { season, team, .. } => ResolvedPart::League {
                season_col: table.require_column(season)?,
                team_col: table.require_column(team)?,
                season,
                team,
            },
        })
    }
}

/// A key part with its column positions looked up once.
enum ResolvedPart<'k> {
    Column {
        col: usize,
        source: &'k str,
    },
    Season {
        col: usize,
        source: &'k str,
    },
    League {
        season_col: usize,
        team_col: usize,
        season: &'k str,
        team: &'k str,
    },
}

impl ResolvedPart<'_> {
    fn value(
        &self,
        table: &Table,
        row: usize,
        leagues: Option<&LeagueMap>,
    ) -> Result<String, SchemaError> {
        match self {
            ResolvedPart::Column { col, source } => {
                Ok(key_cell(table, row, *col, source)?.to_string())
            }
            ResolvedPart::Season { col, source } => key_season(table, row, *col, source),
            ResolvedPart::League {
                season_col,
                team_col,
                season,
                team,
            } => {
                let year = key_season(table, row, *season_col, season)?;
                let team_id = key_cell(table, row, *team_col, team)?;
                match leagues {
                    Some(map) if !map.is_empty() => map
                        .get(&year, team_id)
                        .map(str::to_string)
                        .ok_or_else(|| SchemaError::MissingKey {
                            dataset: table.name().to_string(),
                            row: row + 1,
                            column: format!("lg_id for {} {}", year, team_id),
                        }),
                    _ => Ok(DEFAULT_LEAGUE.to_string()),
                }
            }
        }
    }
}

fn key_cell<'t>(
    table: &'t Table,
    row: usize,
    col: usize,
    column: &str,
) -> Result<&'t str, SchemaError> {
    let v = table.rows()[row][col].trim();
    if v.is_empty() {
        return Err(SchemaError::MissingKey {
            dataset: table.name().to_string(),
            row: row + 1,
            column: column.to_string(),
        });
    }
    Ok(v)
}

fn key_season(table: &Table, row: usize, col: usize, column: &str) -> Result<String, SchemaError> {
    let game_id = key_cell(table, row, col, column)?;
    season_of(game_id)
        .map(str::to_string)
        .ok_or_else(|| SchemaError::InvalidKey {
            dataset: table.name().to_string(),
            row: row + 1,
            column: column.to_string(),
            value: game_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn stats(names: &[&str]) -> Vec<String> {
        cells(names)
    }

    fn team_games() -> Table {
        Table::from_rows(
            "team_game",
            vec!["game_id", "team_id", "r", "hr"],
            vec![
                cells(&["BOS201904010", "BOS", "3", "1"]),
                cells(&["BOS201904010", "NYA", "5", "2"]),
                cells(&["BOS201904020", "BOS", "4", "0"]),
                cells(&["BOS201904020", "NYA", "1", "1"]),
                cells(&["NYA201804010", "BOS", "7", "3"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_season_of() {
        assert_eq!(season_of("BOS201904010"), Some("2019"));
        assert_eq!(season_of("BOS20190401"), None);
        assert_eq!(season_of("BOSX01904010"), None);
    }

    #[test]
    fn test_game_level() {
        let set = Aggregator::new()
            .aggregate(&team_games(), &AggregationLevel::Game.key("team_id"), &stats(&["r"]))
            .unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.key_names, cells(&["game_id", "team_id"]));
        let rec = set.get(&cells(&["BOS201904010", "NYA"])).unwrap();
        assert_eq!(rec.get("r"), Some(5));
    }

    #[test]
    fn test_team_season_level() {
        let set = Aggregator::new()
            .aggregate(
                &team_games(),
                &AggregationLevel::TeamSeason.key("team_id"),
                &stats(&["r", "hr"]),
            )
            .unwrap();
        assert_eq!(set.len(), 3);
        let bos = set.get(&cells(&["2019", "BOS"])).unwrap();
        assert_eq!(bos.get("r"), Some(7));
        assert_eq!(bos.get("hr"), Some(1));
        assert_eq!(set.get(&cells(&["2018", "BOS"])).unwrap().get("r"), Some(7));
    }

    #[test]
    fn test_league_season_with_and_without_map() {
        let key = AggregationLevel::LeagueSeason.key("team_id");

        let set = Aggregator::new()
            .aggregate(&team_games(), &key, &stats(&["r"]))
            .unwrap();
        assert_eq!(set.get(&cells(&["2019", "MLB"])).unwrap().get("r"), Some(13));

        let mut leagues = LeagueMap::new();
        leagues.insert("2019", "BOS", "AL");
        leagues.insert("2019", "NYA", "NL");
        leagues.insert("2018", "BOS", "AL");
        let set = Aggregator::with_leagues(&leagues)
            .aggregate(&team_games(), &key, &stats(&["r"]))
            .unwrap();
        assert_eq!(set.get(&cells(&["2019", "AL"])).unwrap().get("r"), Some(7));
        assert_eq!(set.get(&cells(&["2019", "NL"])).unwrap().get("r"), Some(6));
        assert_eq!(set.get(&cells(&["2018", "AL"])).unwrap().get("r"), Some(7));
    }

    #[test]
    fn test_league_missing_from_map_is_error() {
        let mut leagues = LeagueMap::new();
        leagues.insert("2019", "BOS", "AL");
        let err = Aggregator::with_leagues(&leagues)
            .aggregate(
                &team_games(),
                &AggregationLevel::LeagueSeason.key("team_id"),
                &stats(&["r"]),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingKey { row: 2, .. }));
    }

    #[test]
    fn test_missing_key_value_is_error() {
        let mut t = team_games();
        t.push_row(cells(&["BOS201904030", "", "2", "0"])).unwrap();
        let err = Aggregator::new()
            .aggregate(&t, &AggregationLevel::Game.key("team_id"), &stats(&["r"]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingKey {
                dataset: "team_game".into(),
                row: 6,
                column: "team_id".into()
            }
        );
    }

    #[test]
    fn test_invalid_game_id_is_error() {
        let mut t = team_games();
        t.push_row(cells(&["garbage", "BOS", "2", "0"])).unwrap();
        let err = Aggregator::new()
            .aggregate(&t, &AggregationLevel::TeamSeason.key("team_id"), &stats(&["r"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKey { row: 6, .. }));
    }

    #[test]
    fn test_unknown_stat_column() {
        let err = Aggregator::new()
            .aggregate(&team_games(), &AggregationLevel::Game.key("team_id"), &stats(&["sb"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumns { .. }));
    }

    #[test]
    fn test_merge_adds_stats() {
        let mut a = AggregateSet::new("a", cells(&["game_id", "team_id"]));
        a.add(cells(&["G1", "BOS"]), "so", 3);
        let mut b = AggregateSet::new("b", cells(&["game_id", "team_id"]));
        b.add(cells(&["G1", "BOS"]), "bk", 1);
        b.add(cells(&["G1", "NYA"]), "bk", 0);
        a.merge(b).unwrap();

        let rec = a.get(&cells(&["G1", "BOS"])).unwrap();
        assert_eq!((rec.get("so"), rec.get("bk")), (Some(3), Some(1)));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_fill_missing_zeroes_absent_stats_only() {
        let mut set = AggregateSet::new("events", cells(&["game_id", "team_id"]));
        set.add(cells(&["G1", "NYA"]), "so", 1);
        set.add(cells(&["G1", "BOS"]), "bk", 2);
        set.fill_missing(&["so", "bk"]);

        let nya = set.get(&cells(&["G1", "NYA"])).unwrap();
        assert_eq!((nya.get("so"), nya.get("bk")), (Some(1), Some(0)));
        let bos = set.get(&cells(&["G1", "BOS"])).unwrap();
        assert_eq!((bos.get("so"), bos.get("bk")), (Some(0), Some(2)));
    }

    #[test]
    fn test_league_map_from_table() {
        let t = Table::from_rows(
            "team_game",
            vec!["game_id", "team_id", "team_league_id"],
            vec![
                cells(&["BOS201904010", "BOS", "AL"]),
                cells(&["BOS201904010", "NYA", ""]),
            ],
        )
        .unwrap();
        let map = LeagueMap::from_table(&t, "game_id", "team_id", "team_league_id").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("2019", "BOS"), Some("AL"));

        let seasons = Table::from_rows(
            "reference",
            vec!["year_id", "team_id", "lg_id"],
            vec![cells(&["2019", "NYA", "AL"]), cells(&["2019", "SFN", "NL"])],
        )
        .unwrap();
        let map = LeagueMap::from_season_table(&seasons, "year_id", "team_id", "lg_id").unwrap();
        assert_eq!(map.get("2019", "SFN"), Some("NL"));
    }
}
