use std::sync::Arc;

use tracing::{debug, info, warn};

use coach_core::catalog::{MuscleGroup, group_by_muscle};
use coach_core::model::{
    Exercise, ExerciseDetails, ExerciseId, Student, StudentId, StudentProfile,
};
use storage::repository::{ExerciseRepository, StudentRepository};

use crate::error::RosterServiceError;

/// Students and the global exercise catalog.
#[derive(Clone)]
pub struct RosterService {
    students: Arc<dyn StudentRepository>,
    exercises: Arc<dyn ExerciseRepository>,
}

impl RosterService {
    #[must_use]
    pub fn new(
        students: Arc<dyn StudentRepository>,
        exercises: Arc<dyn ExerciseRepository>,
    ) -> Self {
        Self {
            students,
            exercises,
        }
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Student` for a blank name.
    pub async fn create_student(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<StudentId, RosterServiceError> {
        let profile = StudentProfile::new(name, email, phone)?;
        let id = self.students.insert_student(&profile).await?;
        info!(student = %id, "created student");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Storage` if repository access fails.
    pub async fn get_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<Student>, RosterServiceError> {
        Ok(self.students.get_student(student_id).await?)
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Storage` if repository access fails.
    pub async fn list_students(&self) -> Result<Vec<Student>, RosterServiceError> {
        let students = self.students.list_students().await?;
        debug!(len = students.len(), "listed students");
        Ok(students)
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Student` for a blank name and
    /// `Storage(NotFound)` for a stale id.
    pub async fn update_student(
        &self,
        student_id: StudentId,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<(), RosterServiceError> {
        let profile = StudentProfile::new(name, email, phone)?;
        self.students.update_student(student_id, &profile).await?;
        info!(student = %student_id, "updated student");
        Ok(())
    }

    /// Removes the student with all of their history, set rows and
    /// categories.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` for a stale id.
    pub async fn delete_student(&self, student_id: StudentId) -> Result<(), RosterServiceError> {
        if let Err(err) = self.students.delete_student(student_id).await {
            warn!(student = %student_id, error = %err, "student delete failed");
            return Err(err.into());
        }
        info!(student = %student_id, "deleted student");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Exercise` for a blank name.
    pub async fn create_exercise(
        &self,
        name: String,
        muscle_group: String,
    ) -> Result<ExerciseId, RosterServiceError> {
        let details = ExerciseDetails::new(name, muscle_group)?;
        let id = self.exercises.insert_exercise(&details).await?;
        info!(exercise = %id, "created exercise");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Storage` if repository access fails.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, RosterServiceError> {
        Ok(self.exercises.list_exercises().await?)
    }

    /// The catalog grouped by muscle group.
    ///
    /// # Errors
    ///
    /// Returns `RosterServiceError::Storage` if repository access fails.
    pub async fn exercises_by_muscle_group(&self) -> Result<Vec<MuscleGroup>, RosterServiceError> {
        let exercises = self.exercises.list_exercises().await?;
        Ok(group_by_muscle(exercises))
    }

    /// # Errors
    ///
    /// Returns `RosterServiceError::Exercise` for a blank name and
    /// `Storage(NotFound)` for a stale id.
    pub async fn update_exercise(
        &self,
        exercise_id: ExerciseId,
        name: String,
        muscle_group: String,
    ) -> Result<(), RosterServiceError> {
        let details = ExerciseDetails::new(name, muscle_group)?;
        self.exercises.update_exercise(exercise_id, &details).await?;
        info!(exercise = %exercise_id, "updated exercise");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Storage(Conflict)` while any progress record still uses the
    /// exercise, `Storage(NotFound)` for a stale id.
    pub async fn delete_exercise(&self, exercise_id: ExerciseId) -> Result<(), RosterServiceError> {
        if let Err(err) = self.exercises.delete_exercise(exercise_id).await {
            warn!(exercise = %exercise_id, error = %err, "exercise delete failed");
            return Err(err.into());
        }
        info!(exercise = %exercise_id, "deleted exercise");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use coach_core::catalog::UNGROUPED;
    use storage::repository::InMemoryRepository;

    use crate::ErrorKind;

    fn service() -> RosterService {
        let repo = InMemoryRepository::new();
        RosterService::new(Arc::new(repo.clone()), Arc::new(repo))
    }

    #[tokio::test]
    async fn students_list_by_name_and_drop_blank_contacts() {
        let roster = service();
        roster
            .create_student("Zoe".into(), None, None)
            .await
            .unwrap();
        let ana = roster
            .create_student("Ana".into(), Some("  ".into()), Some("555-0101".into()))
            .await
            .unwrap();

        let students = roster.list_students().await.unwrap();
        let names: Vec<_> = students.iter().map(Student::name).collect();
        assert_eq!(names, vec!["Ana", "Zoe"]);

        let ana = roster.get_student(ana).await.unwrap().unwrap();
        assert_eq!(ana.profile().email(), None);
        assert_eq!(ana.profile().phone(), Some("555-0101"));
    }

    #[tokio::test]
    async fn blank_names_are_validation_errors() {
        let roster = service();
        let err = roster
            .create_student(" ".into(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = roster
            .create_exercise(String::new(), "Legs".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn exercises_group_by_muscle() {
        let roster = service();
        for (name, group) in [("Squat", "Legs"), ("Plank", ""), ("Lunge", "Legs")] {
            roster
                .create_exercise(name.into(), group.into())
                .await
                .unwrap();
        }

        let groups = roster.exercises_by_muscle_group().await.unwrap();
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Legs", UNGROUPED]);
        let legs: Vec<_> = groups[0].exercises.iter().map(Exercise::name).collect();
        assert_eq!(legs, vec!["Lunge", "Squat"]);
    }

    #[tokio::test]
    async fn updating_missing_student_is_not_found() {
        let roster = service();
        let err = roster
            .update_student(StudentId::new(3), "Ana".into(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
