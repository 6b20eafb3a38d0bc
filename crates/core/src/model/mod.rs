mod category;
mod exercise;
mod ids;
mod progress;
mod reps;
mod set_entry;
mod student;

pub use ids::{CategoryId, ExerciseId, ParseIdError, ProgressRecordId, SetEntryId, StudentId};

pub use category::{Category, CategoryError, CategoryName};
pub use exercise::{Exercise, ExerciseDetails, ExerciseError};
pub use progress::{MAX_SET_COUNT, ProgressDraft, ProgressError, ProgressRecord, ProgressValues};
pub use reps::{Reps, RepsError};
pub use set_entry::{LoadedSets, SetDraft, SetEntry, SetEntryError, SetSource, SetType, StoredSet};
pub use student::{Student, StudentError, StudentProfile};
