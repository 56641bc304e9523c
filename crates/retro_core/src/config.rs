//! Run configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration. Command-line flags override loaded values.

use crate::error::ConfigError;
use crate::qa::Tolerance;
use crate::schema::FieldSelection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Relative tolerance for comparisons against the external reference.
pub const DEFAULT_REFERENCE_TOLERANCE: f64 = 0.01;

fn default_data_dir() -> PathBuf {
    PathBuf::from("../data")
}

fn default_true() -> bool {
    true
}

fn default_tolerance() -> f64 {
    DEFAULT_REFERENCE_TOLERANCE
}

/// Play-by-play processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Decode and write play-by-play data.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub fields: FieldSelection,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: FieldSelection::Default,
        }
    }
}

/// Optional external season totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: None,
            tolerance: DEFAULT_REFERENCE_TOLERANCE,
        }
    }
}

impl ReferenceConfig {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance(self.tolerance)
    }
}

/// Lahman tables for the Retrosheet → Lahman id mappings.
///
/// Unset paths default to `{data_dir}/lahman/wrangled/`; mappings are
/// skipped when neither is configured and the defaults do not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LahmanConfig {
    #[serde(default)]
    pub people: Option<PathBuf>,

    #[serde(default)]
    pub teams: Option<PathBuf>,
}

impl LahmanConfig {
    pub fn is_configured(&self) -> bool {
        self.people.is_some() || self.teams.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrangleConfig {
    /// Root holding `retrosheet/collected` and `retrosheet/wrangled`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub event: EventConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub lahman: LahmanConfig,
}

impl Default for WrangleConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            event: EventConfig::default(),
            reference: ReferenceConfig::default(),
            lahman: LahmanConfig::default(),
        }
    }
}

impl WrangleConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: WrangleConfig = if yaml.trim().is_empty() {
            WrangleConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.reference.tolerance;
        if !t.is_finite() || !(0.0..1.0).contains(&t) {
            return Err(ConfigError::Validation(format!(
                "reference.tolerance must be in [0, 1), got {}",
                t
            )));
        }
        if let FieldSelection::Fields(fields) = &self.event.fields {
            if fields.is_empty() {
                return Err(ConfigError::Validation(
                    "event.fields must name at least one field".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn collected_dir(&self) -> PathBuf {
        self.data_dir.join("retrosheet").join("collected")
    }

    pub fn wrangled_dir(&self) -> PathBuf {
        self.data_dir.join("retrosheet").join("wrangled")
    }

    /// Path of an input dataset, e.g. `collected("game")`.
    pub fn collected(&self, dataset: &str) -> PathBuf {
        self.collected_dir().join(format!("{}.csv", dataset))
    }

    pub fn lahman_people(&self) -> PathBuf {
        self.lahman
            .people
            .clone()
            .unwrap_or_else(|| self.lahman_dir().join("people.csv"))
    }

    pub fn lahman_teams(&self) -> PathBuf {
        self.lahman
            .teams
            .clone()
            .unwrap_or_else(|| self.lahman_dir().join("teams.csv"))
    }

    fn lahman_dir(&self) -> PathBuf {
        self.data_dir.join("lahman").join("wrangled")
    }

    /// Path of an output file, e.g. `wrangled("batting.csv")`.
    pub fn wrangled(&self, file: &str) -> PathBuf {
        self.wrangled_dir().join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = WrangleConfig::from_yaml_str("").unwrap();
        assert_eq!(config, WrangleConfig::default());
        assert!(config.event.enabled);
        assert_eq!(config.reference.tolerance, 0.01);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "
data_dir: /tmp/baseball
event:
  fields: [game_id, event_tx]
reference:
  path: lahman_teams.csv
";
        let config = WrangleConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/baseball"));
        assert!(config.event.enabled);
        assert_eq!(
            config.event.fields,
            FieldSelection::Fields(vec!["game_id".into(), "event_tx".into()])
        );
        assert_eq!(config.reference.path, Some(PathBuf::from("lahman_teams.csv")));
        assert_eq!(config.reference.tolerance, DEFAULT_REFERENCE_TOLERANCE);
        assert_eq!(
            config.collected("event"),
            PathBuf::from("/tmp/baseball/retrosheet/collected/event.csv")
        );
        assert_eq!(
            config.wrangled("manifest.json"),
            PathBuf::from("/tmp/baseball/retrosheet/wrangled/manifest.json")
        );
    }

    #[test]
    fn test_lahman_paths() {
        let config = WrangleConfig::from_yaml_str("data_dir: /d\nlahman:\n  teams: /x/teams.csv\n").unwrap();
        assert!(config.lahman.is_configured());
        assert_eq!(config.lahman_people(), PathBuf::from("/d/lahman/wrangled/people.csv"));
        assert_eq!(config.lahman_teams(), PathBuf::from("/x/teams.csv"));
        assert!(!WrangleConfig::default().lahman.is_configured());
    }

    #[test]
    fn test_field_mode_strings() {
        let config = WrangleConfig::from_yaml_str("event:\n  enabled: false\n  fields: all\n").unwrap();
        assert!(!config.event.enabled);
        assert_eq!(config.event.fields, FieldSelection::All);
    }

    #[test]
    fn test_invalid_tolerance() {
        let err = WrangleConfig::from_yaml_str("reference:\n  tolerance: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = WrangleConfig::from_yaml_str("event: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = WrangleConfig::load("/nonexistent/wrangle.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
