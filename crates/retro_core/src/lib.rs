//! # retro_core
//!
//! Post-processing of parsed Retrosheet play-by-play data.
//!
//! ## Modules
//! - `event` - transaction-code decoder and play-by-play enrichment
//! - `schema` - declared input schemas, column projection, field selection
//! - `wrangle` - tidy batting, pitching, fielding, game and team_game tables,
//!   Lahman id mappings
//! - `aggregate` - game, team-season and league-season rollups
//! - `qa` - cross-dataset consistency checks
//! - `config` - run configuration
//!
//! Everything here works on in-memory [`table::Table`]s; reading and
//! writing files is left to the caller.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod qa;
pub mod schema;
pub mod table;
pub mod wrangle;

pub use aggregate::{AggregateSet, AggregationLevel, Aggregator, GroupKey, KeyPart, LeagueMap};
pub use config::{LahmanConfig, WrangleConfig};
pub use error::{ConfigError, DecodeError, EventDecodeError, Result, SchemaError, WrangleError};
pub use event::{decode, decode_event, enrich_events, DerivedField, DerivedFields};
pub use qa::{check_consistency, CheckInputs, ConsistencyReport, Tolerance};
pub use schema::catalog::SCHEMA_VERSION;
pub use schema::{FieldSelection, Projection};
pub use table::Table;
