//! The declared set of cross-dataset comparisons.
//!
//! Every wrangled dataset describes the same games from a different
//! angle, so their rollups must agree exactly. The external reference is
//! compiled independently and is only expected to agree within a
//! relative tolerance.

use super::consistency_checker::{compare, ComparisonReport, ConsistencyReport, StatPair, Tolerance};
use crate::aggregate::{season_of, AggregateSet, AggregationLevel, Aggregator, GroupKey, KeyPart, LeagueMap};
use crate::error::SchemaError;
use crate::event::{DerivedField, Side};
use crate::table::Table;
use std::collections::BTreeSet;
use tracing::info;

pub const EVENTS_VS_TEAM_GAME: &str = "events_vs_team_game";
pub const TEAM_GAME_VS_BATTING: &str = "team_game_vs_batting";
pub const TEAM_GAME_VS_PITCHING: &str = "team_game_vs_pitching";
pub const TEAM_GAME_VS_FIELDING: &str = "team_game_vs_fielding";
pub const TEAM_GAME_VS_REFERENCE_TEAM: &str = "team_game_vs_reference_team_season";
pub const TEAM_GAME_VS_REFERENCE_LEAGUE: &str = "team_game_vs_reference_league_season";

/// team_game name, batting name.
pub const BATTING_PAIRS: &[(&str, &str)] = &[
    ("ab", "ab"),
    ("r", "r"),
    ("h", "h"),
    ("double", "double"),
    ("triple", "triple"),
    ("hr", "hr"),
    ("rbi", "rbi"),
    ("bb", "bb"),
    ("ibb", "ibb"),
    ("so", "so"),
    ("sh", "sh"),
    ("sf", "sf"),
    ("sb", "sb"),
    ("cs", "cs"),
    ("xi", "xi"),
    ("gidp", "gdp"),
    ("hbp", "hp"),
];

pub const PITCHING_STATS: &[&str] = &["er", "wp", "bk"];

pub const FIELDING_STATS: &[&str] = &["po", "a", "e", "pb"];

/// Season totals checked against the reference.
pub const REFERENCE_STATS: &[&str] = &["r", "h", "double", "triple", "hr", "bb", "so", "sb", "cs"];

/// Reference dataset column names.
pub const REFERENCE_YEAR: &str = "year_id";
pub const REFERENCE_TEAM: &str = "team_id";
/// Retrosheet team id in a Lahman-style reference keyed by Lahman ids.
pub const REFERENCE_TEAM_RETRO: &str = "team_id_retro";
pub const REFERENCE_LEAGUE: &str = "lg_id";

/// Everything the comparisons read.
#[derive(Debug, Clone, Copy)]
pub struct CheckInputs<'a> {
    /// Decoded play-by-play; `None` when events are disabled.
    pub events: Option<&'a Table>,
    pub team_game: &'a Table,
    pub batting: &'a Table,
    pub pitching: &'a Table,
    pub fielding: &'a Table,
    /// Season totals per team; `None` when not configured.
    pub reference: Option<&'a Table>,
    pub reference_tolerance: Tolerance,
}

fn names(stats: &[&str]) -> Vec<String> {
    stats.iter().map(|s| s.to_string()).collect()
}

fn same_pairs(stats: &[&str]) -> Vec<StatPair> {
    stats.iter().map(|s| StatPair::same(s)).collect()
}

/// Run every declared comparison whose inputs are present.
pub fn check_consistency(inputs: &CheckInputs<'_>) -> Result<ConsistencyReport, SchemaError> {
    let mut report = ConsistencyReport::default();
    let aggregator = Aggregator::new();
    let season_key = AggregationLevel::TeamSeason.key("team_id");

    match inputs.events {
        Some(events) => report
            .comparisons
            .push(compare_events(events, inputs.team_game)?),
        None => report.skip(EVENTS_VS_TEAM_GAME, "play-by-play processing disabled"),
    }

    let batting_pairs: Vec<StatPair> = BATTING_PAIRS
        .iter()
        .map(|(l, r)| StatPair::renamed(l, r))
        .collect();
    for (name, other, pairs) in [
        (TEAM_GAME_VS_BATTING, inputs.batting, batting_pairs),
        (TEAM_GAME_VS_PITCHING, inputs.pitching, same_pairs(PITCHING_STATS)),
        (TEAM_GAME_VS_FIELDING, inputs.fielding, same_pairs(FIELDING_STATS)),
    ] {
        let left_stats: Vec<String> = pairs.iter().map(|p| p.left.clone()).collect();
        let right_stats: Vec<String> = pairs.iter().map(|p| p.right.clone()).collect();
        let left = aggregator.aggregate(inputs.team_game, &season_key, &left_stats)?;
        let right = aggregator.aggregate(other, &season_key, &right_stats)?;
        report
            .comparisons
            .push(compare(name, &left, &right, &pairs, Tolerance::EXACT)?);
    }

    match inputs.reference {
        Some(reference) => check_reference(inputs, reference, &mut report)?,
        None => {
            report.skip(TEAM_GAME_VS_REFERENCE_TEAM, "no reference dataset configured");
            report.skip(TEAM_GAME_VS_REFERENCE_LEAGUE, "no reference dataset configured");
        }
    }

    info!(
        comparisons = report.comparisons.len(),
        skipped = report.skipped.len(),
        failures = report.failure_count(),
        passed = report.passed(),
        "consistency checks complete"
    );
    Ok(report)
}

/// Event-derived counts against the native team_game counts, per game
/// and team, exactly.
pub fn compare_events(events: &Table, team_game: &Table) -> Result<ComparisonReport, SchemaError> {
    let derived = derived_columns();
    let left = event_rollup(events)?;
    let right = Aggregator::new().aggregate(
        team_game,
        &AggregationLevel::Game.key("team_id"),
        &names(&derived),
    )?;
    compare(EVENTS_VS_TEAM_GAME, &left, &right, &same_pairs(&derived), Tolerance::EXACT)
}

fn derived_columns() -> Vec<&'static str> {
    DerivedField::ALL.iter().map(|f| f.column()).collect()
}

/// Derived counts per game and team. Balks belong to the fielding team,
/// everything else to the batting team.
///
/// A team seen on only one side of the plays of a game still gets every
/// derived count, at 0 for the side it never took.
pub fn event_rollup(events: &Table) -> Result<AggregateSet, SchemaError> {
    let aggregator = Aggregator::new();
    let mut rollup = aggregator.aggregate(
        events,
        &AggregationLevel::Game.key("bat_team_id"),
        &names(&DerivedField::columns_for(Side::Batting)),
    )?;
    let fielding = aggregator.aggregate(
        events,
        &AggregationLevel::Game.key("fld_team_id"),
        &names(&DerivedField::columns_for(Side::Fielding)),
    )?;
    rollup.merge(fielding)?;
    rollup.fill_missing(&derived_columns());
    Ok(rollup)
}

fn check_reference(
    inputs: &CheckInputs<'_>,
    reference: &Table,
    report: &mut ConsistencyReport,
) -> Result<(), SchemaError> {
    let stats = names(REFERENCE_STATS);
    let pairs = same_pairs(REFERENCE_STATS);

    // The reference may cover more seasons than were processed.
    let seasons = seasons_in(inputs.team_game)?;
    let year = reference.require_column(REFERENCE_YEAR)?;
    let mut reference = reference.clone();
    reference.retain_rows(|row| seasons.contains(row[year].trim()));

    let ref_team = reference_team_column(&reference);
    let mut leagues = LeagueMap::from_table(inputs.team_game, "game_id", "team_id", "team_league_id")?;
    if leagues.is_empty() {
        leagues = LeagueMap::from_season_table(&reference, REFERENCE_YEAR, ref_team, REFERENCE_LEAGUE)?;
    }
    let ours = Aggregator::with_leagues(&leagues);
    let theirs = Aggregator::new();

    let levels = [
        (
            TEAM_GAME_VS_REFERENCE_TEAM,
            AggregationLevel::TeamSeason,
            KeyPart::column("team_id", ref_team),
        ),
        (
            TEAM_GAME_VS_REFERENCE_LEAGUE,
            AggregationLevel::LeagueSeason,
            KeyPart::column("lg_id", REFERENCE_LEAGUE),
        ),
    ];
    for (name, level, ref_part) in levels {
        let left = ours.aggregate(inputs.team_game, &level.key("team_id"), &stats)?;
        let ref_key = GroupKey::new(vec![KeyPart::column("year", REFERENCE_YEAR), ref_part]);
        let right = theirs.aggregate(&reference, &ref_key, &stats)?;
        report
            .comparisons
            .push(compare(name, &left, &right, &pairs, inputs.reference_tolerance)?);
    }
    Ok(())
}

/// `team_id_retro` when the reference carries it, else `team_id`.
fn reference_team_column(reference: &Table) -> &'static str {
    if reference.has_column(REFERENCE_TEAM_RETRO) {
        REFERENCE_TEAM_RETRO
    } else {
        REFERENCE_TEAM
    }
}

fn seasons_in(team_game: &Table) -> Result<BTreeSet<String>, SchemaError> {
    let game = team_game.require_column("game_id")?;
    team_game
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            season_of(row[game].trim())
                .map(str::to_string)
                .ok_or_else(|| SchemaError::InvalidKey {
                    dataset: team_game.name().to_string(),
                    row: i + 1,
                    column: "game_id".to_string(),
                    value: row[game].clone(),
                })
        })
        .collect()
}
