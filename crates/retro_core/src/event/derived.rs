//! Derived per-play statistics.

use serde::{Deserialize, Serialize};

/// Which team a derived stat is credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The team at bat (`bat_team_id`).
    Batting,
    /// The team in the field (`fld_team_id`).
    Fielding,
}

/// Statistics computed from the transaction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DerivedField {
    Strikeout,
    StolenBase,
    CaughtStealing,
    Balk,
    Walk,
    IntentionalWalk,
    HitByPitch,
    Interference,
    Single,
    Double,
    Triple,
    HomeRun,
}

impl DerivedField {
    pub const ALL: [DerivedField; 12] = [
        DerivedField::Strikeout,
        DerivedField::StolenBase,
        DerivedField::CaughtStealing,
        DerivedField::Balk,
        DerivedField::Walk,
        DerivedField::IntentionalWalk,
        DerivedField::HitByPitch,
        DerivedField::Interference,
        DerivedField::Single,
        DerivedField::Double,
        DerivedField::Triple,
        DerivedField::HomeRun,
    ];

    /// Output column name; matches the native team-game column.
    pub fn column(&self) -> &'static str {
        match self {
            DerivedField::Strikeout => "so",
            DerivedField::StolenBase => "sb",
            DerivedField::CaughtStealing => "cs",
            DerivedField::Balk => "bk",
            DerivedField::Walk => "bb",
            DerivedField::IntentionalWalk => "ibb",
            DerivedField::HitByPitch => "hbp",
            DerivedField::Interference => "xi",
            DerivedField::Single => "single",
            DerivedField::Double => "double",
            DerivedField::Triple => "triple",
            DerivedField::HomeRun => "hr",
        }
    }

    pub fn side(&self) -> Side {
        match self {
            DerivedField::Balk => Side::Fielding,
            _ => Side::Batting,
        }
    }

    /// Column names for every derived field credited to `side`.
    pub fn columns_for(side: Side) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|f| f.side() == side)
            .map(|f| f.column())
            .collect()
    }
}

/// Counts decoded from one play.
///
/// At most one of the hit fields is set. Stolen bases count each base
/// stolen on the play; every other field is 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedFields {
    pub so: u8,
    pub sb: u8,
    pub cs: u8,
    pub bk: u8,
    pub bb: u8,
    pub ibb: u8,
    pub hbp: u8,
    pub xi: u8,
    pub single: u8,
    pub double: u8,
    pub triple: u8,
    pub hr: u8,
}

impl DerivedFields {
    pub fn get(&self, field: DerivedField) -> u8 {
        match field {
            DerivedField::Strikeout => self.so,
            DerivedField::StolenBase => self.sb,
            DerivedField::CaughtStealing => self.cs,
            DerivedField::Balk => self.bk,
            DerivedField::Walk => self.bb,
            DerivedField::IntentionalWalk => self.ibb,
            DerivedField::HitByPitch => self.hbp,
            DerivedField::Interference => self.xi,
            DerivedField::Single => self.single,
            DerivedField::Double => self.double,
            DerivedField::Triple => self.triple,
            DerivedField::HomeRun => self.hr,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Values in `DerivedField::ALL` order, rendered for CSV output.
    pub fn to_row(&self) -> Vec<String> {
        DerivedField::ALL
            .iter()
            .map(|f| self.get(*f).to_string())
            .collect()
    }

    /// Number of hit fields set; never more than one.
    pub fn hits(&self) -> u8 {
        self.single + self.double + self.triple + self.hr
    }
}
