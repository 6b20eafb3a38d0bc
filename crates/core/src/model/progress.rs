use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CategoryId, ExerciseId, ProgressRecordId, StudentId};
use crate::model::reps::{Reps, RepsError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got {raw:?}")]
    NotNumeric { field: &'static str, raw: String },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        max: u32,
        value: u32,
    },

    #[error(transparent)]
    Reps(#[from] RepsError),
}

/// Upper bound on the number of sets in one entry, aggregate or detailed.
pub const MAX_SET_COUNT: u32 = 100;

//
// ─── VALUES ────────────────────────────────────────────────────────────────────
//

/// The measured fields of a progress record (the legacy aggregate fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgressValues {
    pub load: f64,
    pub reps: Reps,
    pub set_count: u32,
    pub note: String,
}

impl ProgressValues {
    /// Zero-valued entry used when an exercise is first assigned to a student.
    #[must_use]
    pub fn unrecorded() -> Self {
        Self::default()
    }
}

pub(crate) fn coerce_load(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Non-numeric input becomes zero; counts above the limit are clamped to it.
fn coerce_count(raw: Option<&str>) -> u32 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(0)
        .min(MAX_SET_COUNT)
}

fn required<'a>(field: &'static str, raw: Option<&'a str>) -> Result<&'a str, ProgressError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ProgressError::Missing(field))
}

/// Raw form input for a progress entry. Every field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressDraft {
    pub load: Option<String>,
    pub reps: Option<String>,
    pub set_count: Option<String>,
    pub note: Option<String>,
}

impl ProgressDraft {
    /// Lenient conversion used by `append`: missing or non-numeric load, reps
    /// and set count become zero. The set count is clamped to `MAX_SET_COUNT`.
    #[must_use]
    pub fn coerce(self) -> ProgressValues {
        ProgressValues {
            load: coerce_load(self.load.as_deref()),
            reps: Reps::coerce(self.reps.as_deref()),
            set_count: coerce_count(self.set_count.as_deref()),
            note: self.note.unwrap_or_default().trim().to_owned(),
        }
    }

    /// Strict conversion used when editing the current entry.
    ///
    /// Load and set count must be non-zero numbers. Repetitions must be
    /// present and are kept as free text when they are not a plain count.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Missing` for an absent or zero field and
    /// `ProgressError::NotNumeric` when load or set count does not parse.
    /// A set count above `MAX_SET_COUNT` is `ProgressError::TooLarge`.
    pub fn require_complete(self) -> Result<ProgressValues, ProgressError> {
        let raw_load = required("load", self.load.as_deref())?;
        let load = raw_load
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ProgressError::NotNumeric {
                field: "load",
                raw: raw_load.to_owned(),
            })?;
        if load == 0.0 {
            return Err(ProgressError::Missing("load"));
        }

        let reps = Reps::parse_entry(required("reps", self.reps.as_deref())?)?;
        if reps.is_unrecorded() {
            return Err(ProgressError::Missing("reps"));
        }

        let raw_sets = required("set count", self.set_count.as_deref())?;
        let set_count = raw_sets
            .parse::<u32>()
            .map_err(|_| ProgressError::NotNumeric {
                field: "set count",
                raw: raw_sets.to_owned(),
            })?;
        if set_count == 0 {
            return Err(ProgressError::Missing("set count"));
        }
        if set_count > MAX_SET_COUNT {
            return Err(ProgressError::TooLarge {
                field: "set count",
                max: MAX_SET_COUNT,
                value: set_count,
            });
        }

        Ok(ProgressValues {
            load,
            reps,
            set_count,
            note: self.note.unwrap_or_default().trim().to_owned(),
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One dated performance entry for a (student, exercise) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    id: ProgressRecordId,
    student_id: StudentId,
    exercise_id: ExerciseId,
    category_id: Option<CategoryId>,
    #[serde(flatten)]
    values: ProgressValues,
    recorded_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        id: ProgressRecordId,
        student_id: StudentId,
        exercise_id: ExerciseId,
        category_id: Option<CategoryId>,
        values: ProgressValues,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_id,
            exercise_id,
            category_id,
            values,
            recorded_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProgressRecordId {
        self.id
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise_id
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub fn values(&self) -> &ProgressValues {
        &self.values
    }

    #[must_use]
    pub fn load(&self) -> f64 {
        self.values.load
    }

    #[must_use]
    pub fn reps(&self) -> &Reps {
        &self.values.reps
    }

    /// Legacy aggregate set count.
    #[must_use]
    pub fn set_count(&self) -> u32 {
        self.values.set_count
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.values.note
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.category_id = category_id;
    }

    /// Overwrites the measured fields and re-stamps the record.
    pub fn refresh(&mut self, values: ProgressValues, recorded_at: DateTime<Utc>) {
        self.values = values;
        self.recorded_at = recorded_at;
    }
}
