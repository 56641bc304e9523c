//! Retrosheet Wrangler Library
//!
//! Collected parser CSVs → tidy role tables → consistency report →
//! manifest with SHA256 checksums.

pub mod io;

use anyhow::{Context, Result};
use retro_core::event::EnrichedEvents;
use retro_core::qa::{check_consistency, CheckInputs, ConsistencyReport};
use retro_core::schema::catalog::{EVENT, GAME, PLAYER_GAME, SCHEMA_VERSION};
use retro_core::wrangle::{id_mappings, wrangle_game, wrangle_player_game};
use retro_core::{enrich_events, Table, WrangleConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub use io::{checksum, read_table, write_table, FileEntry};

pub const REPORT_FILE: &str = "consistency_report.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Record of one run's outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Version of the declared input schemas (e.g. "v1")
    pub schema_version: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// Whether every consistency check passed
    pub consistency_passed: bool,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub manifest: Manifest,
    pub report: ConsistencyReport,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

/// Load the optional reference dataset.
pub fn load_reference(config: &WrangleConfig) -> Result<Option<Table>> {
    match &config.reference.path {
        Some(path) => Ok(Some(read_table(path, "reference")?)),
        None => Ok(None),
    }
}

/// Load the Lahman people and teams tables, if available.
///
/// Explicitly configured paths must exist; the default locations are
/// only used when both files are present.
pub fn load_lahman(config: &WrangleConfig) -> Result<Option<(Table, Table)>> {
    let (people, teams) = (config.lahman_people(), config.lahman_teams());
    if !config.lahman.is_configured() && !(people.exists() && teams.exists()) {
        info!(
            people = %people.display(),
            teams = %teams.display(),
            "Lahman tables not found; id mappings skipped"
        );
        return Ok(None);
    }
    Ok(Some((read_table(&people, "people")?, read_table(&teams, "teams")?)))
}

/// Run the whole pipeline for `config`.
///
/// Structural problems (schema drift, undecodable codes, bad keys) abort
/// the run. Consistency failures do not: every output and the report are
/// still written so the disagreement can be inspected.
pub fn run(config: &WrangleConfig) -> Result<RunSummary> {
    config.validate()?;
    info!(
        data_dir = %config.data_dir.display(),
        events = config.event.enabled,
        reference = config.reference.path.is_some(),
        "wrangling"
    );

    let player_game = read_table(&config.collected(PLAYER_GAME), PLAYER_GAME)?;
    let roles = wrangle_player_game(&player_game)
        .with_context(|| format!("Failed to wrangle {}", config.collected(PLAYER_GAME).display()))?;
    drop(player_game);

    let game = read_table(&config.collected(GAME), GAME)?;
    let games = wrangle_game(&game)
        .with_context(|| format!("Failed to wrangle {}", config.collected(GAME).display()))?;
    drop(game);

    let events: Option<EnrichedEvents> = if config.event.enabled {
        let raw = read_table(&config.collected(EVENT), EVENT)?;
        Some(
            enrich_events(&raw, &config.event.fields)
                .with_context(|| format!("Failed to decode {}", config.collected(EVENT).display()))?,
        )
    } else {
        info!("play-by-play processing disabled");
        None
    };

    let reference = load_reference(config)?;
    let mappings = load_lahman(config)?
        .map(|(people, teams)| id_mappings(&people, &teams, &roles.batting))
        .transpose()
        .context("Failed to build Lahman id mappings")?;

    let report = check_consistency(&CheckInputs {
        events: events.as_ref().map(|e| &e.derived),
        team_game: &games.team_game,
        batting: &roles.batting,
        pitching: &roles.pitching,
        fielding: &roles.fielding,
        reference: reference.as_ref(),
        reference_tolerance: config.reference.tolerance(),
    })
    .context("Consistency checks could not run")?;

    let mut outputs: Vec<&Table> = vec![
        &roles.appearance,
        &roles.batting,
        &roles.pitching,
        &roles.fielding,
        &games.team_game,
        &games.game,
    ];
    if let Some(events) = &events {
        outputs.push(&events.output);
    }
    if let Some(mappings) = &mappings {
        outputs.push(&mappings.players);
        outputs.push(&mappings.teams);
    }

    let mut files = Vec::with_capacity(outputs.len() + 1);
    for table in outputs {
        let path = config.wrangled(&format!("{}.csv", table.name()));
        files.push(write_table(table, &path)?);
    }

    let report_path = config.wrangled(REPORT_FILE);
    write_json(&report_path, &report)?;
    files.push(FileEntry {
        file: REPORT_FILE.to_string(),
        rows: report.check_count(),
        columns: 0,
        sha256: checksum(&report_path)?,
    });

    let manifest = Manifest {
        schema_version: SCHEMA_VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        consistency_passed: report.passed(),
        files,
    };
    write_json(&config.wrangled(MANIFEST_FILE), &manifest)?;

    if report.passed() {
        info!(checks = report.check_count(), "all consistency checks passed");
    } else {
        warn!(
            failures = report.failure_count(),
            checks = report.check_count(),
            "consistency checks failed"
        );
    }
    Ok(RunSummary { manifest, report })
}

/// Write `value` as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(file = %io::file_name(path), "written");
    Ok(())
}
