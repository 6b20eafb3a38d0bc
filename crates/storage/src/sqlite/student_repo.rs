use coach_core::model::{Student, StudentId, StudentProfile};

use super::SqliteRepository;
use super::mapping::{db, db_insert, id_i64, map_student_row};
use crate::repository::{StorageError, StudentRepository};

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn insert_student(&self, profile: &StudentProfile) -> Result<StudentId, StorageError> {
        let res = sqlx::query("INSERT INTO students (name, email, phone) VALUES (?1, ?2, ?3)")
            .bind(profile.name())
            .bind(profile.email())
            .bind(profile.phone())
            .execute(&self.pool)
            .await
            .map_err(db_insert)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("student_id sign overflow".into()))?;
        Ok(StudentId::new(id))
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query("SELECT id, name, email, phone FROM students WHERE id = ?1")
            .bind(id_i64("student_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        row.as_ref().map(map_student_row).transpose()
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query("SELECT id, name, email, phone FROM students ORDER BY name ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.iter().map(map_student_row).collect()
    }

    async fn update_student(
        &self,
        id: StudentId,
        profile: &StudentProfile,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE students SET name = ?1, email = ?2, phone = ?3 WHERE id = ?4")
            .bind(profile.name())
            .bind(profile.email())
            .bind(profile.phone())
            .bind(id_i64("student_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let student = id_i64("student_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        // Children first: set rows, then history, then categories.
        sqlx::query(
            r"
                DELETE FROM set_entries
                WHERE progress_record_id IN (
                    SELECT id FROM progress_records WHERE student_id = ?1
                )
            ",
        )
        .bind(student)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        sqlx::query("DELETE FROM progress_records WHERE student_id = ?1")
            .bind(student)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        sqlx::query("DELETE FROM categories WHERE student_id = ?1")
            .bind(student)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let res = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(student)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            // Dropping the transaction rolls back the child deletes.
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}
