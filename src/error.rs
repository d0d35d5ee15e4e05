use std::fmt;
use thiserror::Error;

/// Why a single row was left out of the tally. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The row could not be decoded by the row source.
    Unreadable(String),
    /// The row has no field at the email column.
    TooFewFields { expected: usize, found: usize },
    /// The email field has no `@`, or more than one.
    MissingSeparator,
    /// Nothing before the `@`.
    EmptyLocalPart,
    /// The part after the `@` is not a plausible domain.
    InvalidDomain(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "unreadable row: {}", e),
            SkipReason::TooFewFields { expected, found } => {
                write!(f, "too few fields: expected at least {}, got {}", expected, found)
            }
            SkipReason::MissingSeparator => write!(f, "email must contain exactly one '@'"),
            SkipReason::EmptyLocalPart => write!(f, "email has an empty local part"),
            SkipReason::InvalidDomain(d) => write!(f, "invalid email domain: {}", d),
        }
    }
}

/// Bound that a run's valid-record count violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Empty,
    TooFew,
    TooMany,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Empty => write!(f, "no valid records"),
            Bound::TooFew => write!(f, "too few valid records"),
            Bound::TooMany => write!(f, "too many valid records"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("stream failure after {rows_read} rows: {reason}")]
    Stream { rows_read: u64, reason: String },
    #[error("{bound}: counted {count}, admissible range is [{min}, {max}]")]
    RecordCountOutOfBounds {
        bound: Bound,
        count: u64,
        min: u64,
        max: u64,
    },
    #[error("result sink failure: {0}")]
    Sink(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// True for failures of the output step only; the tally itself is sound.
    pub fn is_sink_failure(&self) -> bool {
        matches!(self, TallyError::Sink(_))
    }
}
