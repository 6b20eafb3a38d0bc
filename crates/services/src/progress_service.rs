use std::sync::Arc;

use tracing::{debug, info, warn};

use coach_core::catalog::available_exercises;
use coach_core::model::{
    CategoryId, Exercise, ExerciseId, ProgressDraft, ProgressRecord, ProgressRecordId,
    ProgressValues, StudentId,
};
use storage::repository::{
    CategoryRepository, ExerciseRepository, HistoryFilter, NewProgressRecord,
    ProgressRepository, StorageError, StudentRepository,
};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Records, edits and lists dated progress entries.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
    exercises: Arc<dyn ExerciseRepository>,
    categories: Arc<dyn CategoryRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        students: Arc<dyn StudentRepository>,
        exercises: Arc<dyn ExerciseRepository>,
        categories: Arc<dyn CategoryRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            students,
            exercises,
            categories,
            progress,
        }
    }

    /// Append a new history entry. Missing or non-numeric measurements are
    /// stored as zero.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::ForeignCategory` when the category
    /// context belongs to someone else, and `Storage(NotFound)` for stale ids.
    pub async fn record_progress(
        &self,
        student_id: StudentId,
        exercise_id: ExerciseId,
        category_id: Option<CategoryId>,
        draft: ProgressDraft,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        self.check_category(student_id, category_id).await?;
        self.append(student_id, exercise_id, category_id, draft.coerce())
            .await
    }

    /// Put an exercise on a student's board with a zero-valued entry.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::AlreadyAssigned` if the student already
    /// has the exercise, `Storage(NotFound)` for a missing student or
    /// exercise.
    pub async fn assign_exercise(
        &self,
        student_id: StudentId,
        exercise_id: ExerciseId,
        category_id: Option<CategoryId>,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        if self.students.get_student(student_id).await?.is_none()
            || self.exercises.get_exercise(exercise_id).await?.is_none()
        {
            return Err(StorageError::NotFound.into());
        }

        let existing = self.progress.list_history(student_id, exercise_id).await?;
        if !existing.is_empty() {
            return Err(ProgressServiceError::AlreadyAssigned {
                student_id,
                exercise_id,
            });
        }

        self.check_category(student_id, category_id).await?;
        self.append(
            student_id,
            exercise_id,
            category_id,
            ProgressValues::unrecorded(),
        )
        .await
    }

    /// Overwrite the current entry of an exercise and re-stamp it with the
    /// clock's time. All of load, reps and set count must be filled in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` for incomplete input,
    /// `NotLatest` when `record_id` has a newer sibling, `Storage(NotFound)`
    /// when the record is gone.
    pub async fn update_latest(
        &self,
        record_id: ProgressRecordId,
        draft: ProgressDraft,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let values = draft.require_complete()?;

        let record = self
            .progress
            .get_record(record_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let history = self
            .progress
            .list_history(record.student_id(), record.exercise_id())
            .await?;
        if history.first().map(ProgressRecord::id) != Some(record_id) {
            return Err(ProgressServiceError::NotLatest(record_id));
        }

        match self
            .progress
            .update_latest(record_id, &values, self.clock.now())
            .await
        {
            Ok(updated) => {
                info!(record = %record_id, load = updated.load(), "updated current entry");
                Ok(updated)
            }
            Err(err) => {
                warn!(record = %record_id, error = %err, "update of current entry failed");
                Err(err.into())
            }
        }
    }

    /// Delete one entry and its set rows. Older entries of the same exercise
    /// stay, so the previous one becomes current.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` if the record does not exist.
    pub async fn remove(&self, record_id: ProgressRecordId) -> Result<(), ProgressServiceError> {
        if let Err(err) = self.progress.remove_record(record_id).await {
            warn!(record = %record_id, error = %err, "remove failed");
            return Err(err.into());
        }
        info!(record = %record_id, "removed progress record");
        Ok(())
    }

    /// History of one exercise for one student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn get_history(
        &self,
        student_id: StudentId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<ProgressRecord>, ProgressServiceError> {
        let history = self.progress.list_history(student_id, exercise_id).await?;
        debug!(student = %student_id, exercise = %exercise_id, len = history.len(), "history");
        Ok(history)
    }

    /// All entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn list_history(
        &self,
        filter: HistoryFilter,
    ) -> Result<Vec<ProgressRecord>, ProgressServiceError> {
        let records = self.progress.list_records(filter).await?;
        debug!(?filter, len = records.len(), "listed history");
        Ok(records)
    }

    /// Exercises not yet on the student's board whose name or muscle group
    /// contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn available_exercises(
        &self,
        student_id: StudentId,
        term: &str,
    ) -> Result<Vec<Exercise>, ProgressServiceError> {
        let catalog = self.exercises.list_exercises().await?;
        let current = self.progress.list_current_per_exercise(student_id).await?;
        Ok(available_exercises(&catalog, &current, term))
    }

    async fn check_category(
        &self,
        student_id: StudentId,
        category_id: Option<CategoryId>,
    ) -> Result<(), ProgressServiceError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        let category = self
            .categories
            .get_category(category_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        if category.student_id() != student_id {
            return Err(ProgressServiceError::ForeignCategory {
                category_id,
                student_id,
            });
        }
        Ok(())
    }

    async fn append(
        &self,
        student_id: StudentId,
        exercise_id: ExerciseId,
        category_id: Option<CategoryId>,
        values: ProgressValues,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let record = NewProgressRecord {
            student_id,
            exercise_id,
            category_id,
            values,
            recorded_at: self.clock.now(),
        };
        match self.progress.append_record(record).await {
            Ok(stored) => {
                info!(
                    record = %stored.id(),
                    student = %student_id,
                    exercise = %exercise_id,
                    "appended progress record"
                );
                Ok(stored)
            }
            Err(err) => {
                warn!(student = %student_id, exercise = %exercise_id, error = %err, "append failed");
                Err(err.into())
            }
        }
    }
}
