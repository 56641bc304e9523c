use thiserror::Error;

/// Why a transaction code could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    Empty,
    UnknownEvent(String),
    UnknownRunnerEvent(String),
    UnknownModifier(String),
    InvalidBase(char),
    InvalidAdvance(String),
    UnbalancedParens,
    CompoundNotAllowed(String),
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeErrorKind::Empty => write!(f, "empty code"),
            DecodeErrorKind::UnknownEvent(tok) => write!(f, "unknown event '{}'", tok),
            DecodeErrorKind::UnknownRunnerEvent(tok) => {
                write!(f, "unknown runner event '{}'", tok)
            }
            DecodeErrorKind::UnknownModifier(tok) => write!(f, "unknown modifier '{}'", tok),
            DecodeErrorKind::InvalidBase(c) => write!(f, "invalid base '{}'", c),
            DecodeErrorKind::InvalidAdvance(tok) => write!(f, "invalid advance '{}'", tok),
            DecodeErrorKind::UnbalancedParens => write!(f, "unbalanced parentheses"),
            DecodeErrorKind::CompoundNotAllowed(tok) => {
                write!(f, "'{}' cannot carry a '+' runner event", tok)
            }
        }
    }
}

/// A transaction code that does not fit the event grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode '{code}' at byte {position}: {kind}")]
pub struct DecodeError {
    pub code: String,
    pub position: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(code: &str, position: usize, kind: DecodeErrorKind) -> Self {
        Self {
            code: code.to_string(),
            position,
            kind,
        }
    }
}

/// A decode failure tied to the play that carried it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("game {game_id} event {event_id}: {source}")]
pub struct EventDecodeError {
    pub game_id: String,
    pub event_id: String,
    #[source]
    pub source: DecodeError,
}

/// Structural problems with a dataset or a declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{dataset}: unknown field(s) requested: {}", .fields.join(", "))]
    UnknownFields { dataset: String, fields: Vec<String> },

    #[error("{dataset}: input is missing declared column(s): {}", .columns.join(", "))]
    MissingColumns { dataset: String, columns: Vec<String> },

    #[error("{dataset}: input has undeclared column(s): {}", .columns.join(", "))]
    UnexpectedColumns { dataset: String, columns: Vec<String> },

    #[error("{dataset}: duplicate column '{column}'")]
    DuplicateColumn { dataset: String, column: String },

    #[error("{dataset}: partition leaves column(s) uncovered: {}", .columns.join(", "))]
    UncoveredColumns { dataset: String, columns: Vec<String> },

    #[error("{dataset}: column '{column}' claimed by groups '{first}' and '{second}'")]
    OverlappingColumns {
        dataset: String,
        column: String,
        first: String,
        second: String,
    },

    #[error("{dataset}: row {row} has no value for key column '{column}'")]
    MissingKey {
        dataset: String,
        row: usize,
        column: String,
    },

    #[error("{dataset}: row {row} has invalid key '{value}' in column '{column}'")]
    InvalidKey {
        dataset: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{dataset}: row {row} column '{column}' is not an integer: '{value}'")]
    InvalidNumber {
        dataset: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{dataset}: row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        dataset: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Problems loading or validating a run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors that abort processing of a dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WrangleError {
    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, WrangleError>;
