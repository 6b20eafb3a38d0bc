use coach_core::model::{Exercise, ExerciseDetails, ExerciseId};

use super::SqliteRepository;
use super::mapping::{db, db_insert, id_i64, map_exercise_row};
use crate::repository::{ExerciseRepository, StorageError};

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn insert_exercise(
        &self,
        details: &ExerciseDetails,
    ) -> Result<ExerciseId, StorageError> {
        let res = sqlx::query("INSERT INTO exercises (name, muscle_group) VALUES (?1, ?2)")
            .bind(details.name())
            .bind(details.muscle_group())
            .execute(&self.pool)
            .await
            .map_err(db_insert)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("exercise_id sign overflow".into()))?;
        Ok(ExerciseId::new(id))
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let row = sqlx::query("SELECT id, name, muscle_group FROM exercises WHERE id = ?1")
            .bind(id_i64("exercise_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        row.as_ref().map(map_exercise_row).transpose()
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let rows =
            sqlx::query("SELECT id, name, muscle_group FROM exercises ORDER BY name ASC, id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;
        rows.iter().map(map_exercise_row).collect()
    }

    async fn update_exercise(
        &self,
        id: ExerciseId,
        details: &ExerciseDetails,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE exercises SET name = ?1, muscle_group = ?2 WHERE id = ?3")
            .bind(details.name())
            .bind(details.muscle_group())
            .bind(id_i64("exercise_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let exercise = id_i64("exercise_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let in_use = sqlx::query("SELECT 1 FROM progress_records WHERE exercise_id = ?1 LIMIT 1")
            .bind(exercise)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?;
        if in_use.is_some() {
            return Err(StorageError::Conflict(format!(
                "exercise {id} still has progress records"
            )));
        }

        let res = sqlx::query("DELETE FROM exercises WHERE id = ?1")
            .bind(exercise)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}
