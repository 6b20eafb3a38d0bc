use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use coach_core::board::{Board, partition};
use coach_core::derive::{CurrentView, current_per_exercise, derive_current};
use coach_core::model::{Exercise, ProgressRecord, StudentId};
use storage::repository::{
    CategoryRepository, ExerciseRepository, ProgressRepository, SetEntryRepository,
    StorageError, StudentRepository,
};

use crate::error::BoardServiceError;

/// One exercise on a student's board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub view: CurrentView,
    /// `None` when the exercise row could not be found.
    pub exercise: Option<Exercise>,
}

/// Builds the categorised "current state" view of a student.
#[derive(Clone)]
pub struct BoardService {
    students: Arc<dyn StudentRepository>,
    exercises: Arc<dyn ExerciseRepository>,
    categories: Arc<dyn CategoryRepository>,
    progress: Arc<dyn ProgressRepository>,
    sets: Arc<dyn SetEntryRepository>,
}

impl BoardService {
    #[must_use]
    pub fn new(
        students: Arc<dyn StudentRepository>,
        exercises: Arc<dyn ExerciseRepository>,
        categories: Arc<dyn CategoryRepository>,
        progress: Arc<dyn ProgressRepository>,
        sets: Arc<dyn SetEntryRepository>,
    ) -> Self {
        Self {
            students,
            exercises,
            categories,
            progress,
            sets,
        }
    }

    /// Current record per exercise, annotated and bucketed by category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if the student does not
    /// exist, or any other storage failure.
    pub async fn get_current_board(
        &self,
        student_id: StudentId,
    ) -> Result<Board<BoardRow>, BoardServiceError> {
        if self.students.get_student(student_id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }

        // Set rows are only counted for the current record of each exercise.
        let current = current_per_exercise(self.progress.list_student_history(student_id).await?);
        let ids: Vec<_> = current.iter().map(ProgressRecord::id).collect();
        let counts = self.sets.count_sets(&ids).await?;
        let views = derive_current(current, &counts);

        let categories = self.categories.list_categories(student_id).await?;
        let catalog: HashMap<_, _> = self
            .exercises
            .list_exercises()
            .await?
            .into_iter()
            .map(|exercise| (exercise.id(), exercise))
            .collect();

        let board = partition(views, &categories).map(|view| BoardRow {
            exercise: catalog.get(&view.record.exercise_id()).cloned(),
            view,
        });
        debug!(
            student = %student_id,
            rows = board.len(),
            buckets = board.buckets().len(),
            "built current board"
        );
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use coach_core::board::BucketKey;
    use coach_core::model::{
        CategoryName, ExerciseDetails, ProgressValues, Reps, SetEntry, SetType, StudentProfile,
    };
    use coach_core::time::fixed_now;
    use storage::repository::{NewCategoryRecord, NewProgressRecord, Storage};

    fn service(storage: &Storage) -> BoardService {
        BoardService::new(
            Arc::clone(&storage.students),
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.categories),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sets),
        )
    }

    #[tokio::test]
    async fn board_buckets_current_rows_with_metadata() {
        let storage = Storage::in_memory();
        let student = storage
            .students
            .insert_student(&StudentProfile::new("Ana", None, None).unwrap())
            .await
            .unwrap();
        let squat = storage
            .exercises
            .insert_exercise(&ExerciseDetails::new("Squat", "Legs").unwrap())
            .await
            .unwrap();
        let press = storage
            .exercises
            .insert_exercise(&ExerciseDetails::new("Press", "Shoulders").unwrap())
            .await
            .unwrap();
        let legs = storage
            .categories
            .insert_category(NewCategoryRecord {
                student_id: student,
                name: CategoryName::new("Legs day").unwrap(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let empty = storage
            .categories
            .insert_category(NewCategoryRecord {
                student_id: student,
                name: CategoryName::new("Cardio").unwrap(),
                created_at: fixed_now() + Duration::seconds(1),
            })
            .await
            .unwrap();

        for (minutes, load) in [(0, 20.0), (10, 25.0)] {
            storage
                .progress
                .append_record(NewProgressRecord {
                    student_id: student,
                    exercise_id: squat,
                    category_id: Some(legs.id()),
                    values: ProgressValues {
                        load,
                        reps: Reps::Count(10),
                        set_count: 3,
                        note: String::new(),
                    },
                    recorded_at: fixed_now() + Duration::minutes(minutes),
                })
                .await
                .unwrap();
        }
        let unrecorded = storage
            .progress
            .append_record(NewProgressRecord {
                student_id: student,
                exercise_id: press,
                category_id: None,
                values: ProgressValues::unrecorded(),
                recorded_at: fixed_now(),
            })
            .await
            .unwrap();
        storage
            .sets
            .replace_sets(
                unrecorded.id(),
                &[SetEntry {
                    kind: SetType::Warmup,
                    load: 5.0,
                    reps: Reps::Count(12),
                    note: String::new(),
                }],
            )
            .await
            .unwrap();

        let board = service(&storage).get_current_board(student).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board.buckets().len(), 3);

        let legs_rows = &board.bucket(BucketKey::Category(legs.id())).unwrap().items;
        assert_eq!(legs_rows.len(), 1);
        assert_eq!(legs_rows[0].view.display.load, Some(25.0));
        assert_eq!(legs_rows[0].exercise.as_ref().unwrap().name(), "Squat");

        let loose = board.uncategorized();
        assert_eq!(loose[0].view.effective_sets, 1);
        assert_eq!(loose[0].view.display.load, None);
        assert_eq!(loose[0].view.display.reps, None);

        assert!(board
            .bucket(BucketKey::Category(empty.id()))
            .unwrap()
            .items
            .is_empty());
    }

    #[tokio::test]
    async fn board_for_unknown_student_is_not_found() {
        let storage = Storage::in_memory();
        let err = service(&storage)
            .get_current_board(StudentId::new(7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
