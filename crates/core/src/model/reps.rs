use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepsError {
    #[error("repetitions cannot be empty")]
    Empty,
}

/// Repetition value of a record or set.
///
/// Most entries are a plain count, but trainers also write ranges or notes
/// such as `8-10` or `until failure`; those are kept verbatim as `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

impl Default for Reps {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl Reps {
    /// Lenient numeric coercion used when appending records: anything that is
    /// not a whole number becomes `Count(0)`.
    #[must_use]
    pub fn coerce(raw: Option<&str>) -> Self {
        let count = raw
            .map(str::trim)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(0);
        Self::Count(count)
    }

    /// Parses a repetition entry without numeric coercion.
    ///
    /// Whole numbers become `Count`; any other non-empty text is kept as `Text`.
    ///
    /// # Errors
    ///
    /// Returns `RepsError::Empty` if the input is empty after trimming.
    pub fn parse_entry(raw: &str) -> Result<Self, RepsError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RepsError::Empty);
        }
        Ok(trimmed
            .parse::<u32>()
            .map_or_else(|_| Self::Text(trimmed.to_owned()), Self::Count))
    }

    /// Rebuilds a value from its stored text column.
    #[must_use]
    pub fn from_stored(stored: &str) -> Self {
        match stored.trim() {
            "" => Self::Count(0),
            trimmed => trimmed
                .parse::<u32>()
                .map_or_else(|_| Self::Text(trimmed.to_owned()), Self::Count),
        }
    }

    /// True for the "not yet recorded" sentinels: zero, empty text, or `"0"`.
    #[must_use]
    pub fn is_unrecorded(&self) -> bool {
        match self {
            Self::Count(n) => *n == 0,
            Self::Text(text) => {
                let text = text.trim();
                text.is_empty() || text == "0"
            }
        }
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
