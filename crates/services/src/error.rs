//! Shared error types for the services crate.

use thiserror::Error;

use coach_core::model::{
    CategoryError, CategoryId, ExerciseError, ExerciseId, ProgressError, ProgressRecordId,
    SetEntryError, StudentError, StudentId,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification of every service failure, for callers that only
/// need to decide between "fix the input", "refresh", "retry later" and
/// "report a defect".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input; nothing was written.
    Validation,
    /// A stale id; the caller should refresh its view.
    NotFound,
    /// The backend failed. The message is carried verbatim.
    Storage,
    /// A dependent row survived a delete.
    Integrity,
}

impl ErrorKind {
    #[must_use]
    pub fn of_storage(err: &StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            StorageError::Conflict(_) => Self::Validation,
            StorageError::Integrity(_) => Self::Integrity,
            _ => Self::Storage,
        }
    }
}

/// Errors emitted by `BoardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoardServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BoardServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(err) => ErrorKind::of_storage(err),
        }
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("student {student_id} already has exercise {exercise_id}")]
    AlreadyAssigned {
        student_id: StudentId,
        exercise_id: ExerciseId,
    },
    #[error("record {0} is not the current entry for its exercise")]
    NotLatest(ProgressRecordId),
    #[error("category {category_id} does not belong to student {student_id}")]
    ForeignCategory {
        category_id: CategoryId,
        student_id: StudentId,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Progress(_)
            | Self::AlreadyAssigned { .. }
            | Self::NotLatest(_)
            | Self::ForeignCategory { .. } => ErrorKind::Validation,
            Self::Storage(err) => ErrorKind::of_storage(err),
        }
    }
}

/// Errors emitted by `SetService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetServiceError {
    #[error(transparent)]
    Sets(#[from] SetEntryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SetServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sets(_) => ErrorKind::Validation,
            Self::Storage(err) => ErrorKind::of_storage(err),
        }
    }
}

/// Errors emitted by `CategoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CategoryServiceError {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error("category {category_id} does not belong to student {student_id}")]
    ForeignCategory {
        category_id: CategoryId,
        student_id: StudentId,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CategoryServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Category(_) | Self::ForeignCategory { .. } => ErrorKind::Validation,
            Self::Storage(err) => ErrorKind::of_storage(err),
        }
    }
}

/// Errors emitted by `RosterService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RosterServiceError {
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RosterServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Student(_) | Self::Exercise(_) => ErrorKind::Validation,
            Self::Storage(err) => ErrorKind::of_storage(err),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
