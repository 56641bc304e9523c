//! # Play-by-Play Events
//!
//! - `code` - transaction code decoder
//! - `derived` - the derived stat record and its column names
//! - `enrich` - appends derived columns to a projected event table

pub mod code;
pub mod derived;
pub mod enrich;

pub use code::{decode, decode_event};
pub use derived::{DerivedField, DerivedFields, Side};
pub use enrich::{enrich_events, EnrichedEvents};
