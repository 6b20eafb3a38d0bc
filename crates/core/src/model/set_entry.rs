use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ProgressRecordId, SetEntryId};
use crate::model::progress::{MAX_SET_COUNT, ProgressRecord, coerce_load};
use crate::model::reps::{Reps, RepsError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetEntryError {
    #[error("unknown set type: {0}")]
    UnknownType(String),

    #[error("set {position}: {source}")]
    Reps { position: usize, source: RepsError },

    #[error("at most {max} sets per entry, got {count}")]
    TooMany { max: u32, count: usize },
}

//
// ─── SET TYPE ──────────────────────────────────────────────────────────────────
//

/// Role of a set within an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    Warmup,
    Preparation,
    #[serde(rename = "valid_1")]
    Valid1,
    #[serde(rename = "valid_2")]
    Valid2,
    #[serde(rename = "valid_3")]
    Valid3,
}

impl SetType {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Preparation => "preparation",
            Self::Valid1 => "valid_1",
            Self::Valid2 => "valid_2",
            Self::Valid3 => "valid_3",
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetType {
    type Err = SetEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "warmup" => Ok(Self::Warmup),
            "preparation" => Ok(Self::Preparation),
            "valid_1" | "valid-1" => Ok(Self::Valid1),
            "valid_2" | "valid-2" => Ok(Self::Valid2),
            "valid_3" | "valid-3" => Ok(Self::Valid3),
            other => Err(SetEntryError::UnknownType(other.to_owned())),
        }
    }
}

//
// ─── SET ENTRY ─────────────────────────────────────────────────────────────────
//

/// One set of an exercise. Position is implied by its index in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub kind: SetType,
    pub load: f64,
    pub reps: Reps,
    pub note: String,
}

/// Raw editor input for one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDraft {
    pub kind: SetType,
    pub load: String,
    pub reps: String,
    pub note: String,
}

impl SetDraft {
    /// Validates a whole editor sequence, preserving order.
    ///
    /// Load falls back to zero when it is not a number; repetitions keep free
    /// text but must not be empty.
    ///
    /// # Errors
    ///
    /// Returns `SetEntryError::TooMany` above `MAX_SET_COUNT` entries and
    /// `SetEntryError::Reps` naming the first offending position.
    pub fn validate_all(drafts: Vec<SetDraft>) -> Result<Vec<SetEntry>, SetEntryError> {
        if drafts.len() > MAX_SET_COUNT as usize {
            return Err(SetEntryError::TooMany {
                max: MAX_SET_COUNT,
                count: drafts.len(),
            });
        }
        drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| {
                let reps = Reps::parse_entry(&draft.reps)
                    .map_err(|source| SetEntryError::Reps { position, source })?;
                Ok(SetEntry {
                    kind: draft.kind,
                    load: coerce_load(Some(&draft.load)),
                    reps,
                    note: draft.note.trim().to_owned(),
                })
            })
            .collect()
    }
}

/// A persisted set row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSet {
    pub id: SetEntryId,
    pub progress_id: ProgressRecordId,
    pub position: u32,
    pub entry: SetEntry,
}

/// Where a loaded set sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetSource {
    /// Rows stored per set.
    Detailed,
    /// Synthesised from the record's aggregate fields.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedSets {
    pub source: SetSource,
    pub entries: Vec<SetEntry>,
}

impl LoadedSets {
    /// Resolve the sets shown for a record.
    ///
    /// Stored rows win. Records created before per-set tracking only carry an
    /// aggregate count, so without rows `set_count` copies of a `valid_1` set
    /// with the record's load and reps are produced instead, never more than
    /// `MAX_SET_COUNT`.
    #[must_use]
    pub fn resolve(record: &ProgressRecord, mut stored: Vec<StoredSet>) -> Self {
        if stored.is_empty() {
            let template = SetEntry {
                kind: SetType::Valid1,
                load: record.load(),
                reps: record.reps().clone(),
                note: String::new(),
            };
            let count = record.set_count().min(MAX_SET_COUNT) as usize;
            return Self {
                source: SetSource::Legacy,
                entries: vec![template; count],
            };
        }

        stored.sort_by_key(|row| row.position);
        Self {
            source: SetSource::Detailed,
            entries: stored.into_iter().map(|row| row.entry).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{ExerciseId, StudentId};
    use crate::model::progress::ProgressValues;
    use crate::time::fixed_now;

    fn legacy_record(set_count: u32) -> ProgressRecord {
        ProgressRecord::new(
            ProgressRecordId::new(1),
            StudentId::new(1),
            ExerciseId::new(1),
            None,
            ProgressValues {
                load: 40.0,
                reps: Reps::Count(10),
                set_count,
                note: "old".into(),
            },
            fixed_now(),
        )
    }

    #[test]
    fn legacy_fallback_repeats_aggregate_fields() {
        let loaded = LoadedSets::resolve(&legacy_record(3), Vec::new());
        assert_eq!(loaded.source, SetSource::Legacy);
        assert_eq!(loaded.entries.len(), 3);
        for entry in &loaded.entries {
            assert_eq!(entry.kind, SetType::Valid1);
            assert!((entry.load - 40.0).abs() < f64::EPSILON);
            assert_eq!(entry.reps, Reps::Count(10));
            assert!(entry.note.is_empty());
        }
    }

    #[test]
    fn legacy_fallback_with_zero_count_is_empty() {
        let loaded = LoadedSets::resolve(&legacy_record(0), Vec::new());
        assert!(loaded.entries.is_empty());
    }

    #[test]
    fn legacy_fallback_is_capped() {
        let loaded = LoadedSets::resolve(&legacy_record(4_000_000_000), Vec::new());
        assert_eq!(loaded.entries.len(), MAX_SET_COUNT as usize);
    }

    #[test]
    fn validate_all_rejects_too_many_sets() {
        let drafts = vec![
            SetDraft {
                kind: SetType::Valid1,
                load: "10".into(),
                reps: "5".into(),
                note: String::new(),
            };
            MAX_SET_COUNT as usize + 1
        ];
        assert!(matches!(
            SetDraft::validate_all(drafts),
            Err(SetEntryError::TooMany { max: MAX_SET_COUNT, .. })
        ));
    }

    #[test]
    fn stored_rows_are_ordered_by_position() {
        let row = |id: u64, position: u32, kind: SetType| StoredSet {
            id: SetEntryId::new(id),
            progress_id: ProgressRecordId::new(1),
            position,
            entry: SetEntry {
                kind,
                load: 10.0,
                reps: Reps::Count(5),
                note: String::new(),
            },
        };
        let loaded = LoadedSets::resolve(
            &legacy_record(3),
            vec![row(2, 1, SetType::Valid1), row(1, 0, SetType::Warmup)],
        );
        assert_eq!(loaded.source, SetSource::Detailed);
        let kinds: Vec<_> = loaded.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![SetType::Warmup, SetType::Valid1]);
    }

    #[test]
    fn validate_all_reports_position_of_empty_reps() {
        let drafts = vec![
            SetDraft {
                kind: SetType::Warmup,
                load: "20".into(),
                reps: "12".into(),
                note: String::new(),
            },
            SetDraft {
                kind: SetType::Valid1,
                load: "x".into(),
                reps: " ".into(),
                note: String::new(),
            },
        ];
        let err = SetDraft::validate_all(drafts).unwrap_err();
        assert_eq!(
            err,
            SetEntryError::Reps {
                position: 1,
                source: RepsError::Empty
            }
        );
    }

    #[test]
    fn set_type_parses_both_spellings() {
        assert_eq!("valid-2".parse::<SetType>().unwrap(), SetType::Valid2);
        assert_eq!("valid_3".parse::<SetType>().unwrap(), SetType::Valid3);
        assert!("cooldown".parse::<SetType>().is_err());
    }
}
