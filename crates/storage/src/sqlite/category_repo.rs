use coach_core::model::{Category, CategoryId, CategoryName, StudentId};

use super::SqliteRepository;
use super::mapping::{db, db_insert, id_i64, map_category_row};
use crate::repository::{CategoryRepository, NewCategoryRecord, StorageError};

#[async_trait::async_trait]
impl CategoryRepository for SqliteRepository {
    async fn insert_category(
        &self,
        category: NewCategoryRecord,
    ) -> Result<Category, StorageError> {
        let row = sqlx::query(
            r"
                INSERT INTO categories (student_id, name, created_at)
                VALUES (?1, ?2, ?3)
                RETURNING id, student_id, name, created_at
            ",
        )
        .bind(id_i64("student_id", category.student_id.value())?)
        .bind(category.name.as_str())
        .bind(category.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_insert)?;

        map_category_row(&row)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let row =
            sqlx::query("SELECT id, student_id, name, created_at FROM categories WHERE id = ?1")
                .bind(id_i64("category_id", id.value())?)
                .fetch_optional(&self.pool)
                .await
                .map_err(db)?;
        row.as_ref().map(map_category_row).transpose()
    }

    async fn list_categories(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, student_id, name, created_at
                FROM categories
                WHERE student_id = ?1
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        rows.iter().map(map_category_row).collect()
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE categories SET name = ?1 WHERE id = ?2")
            .bind(name.as_str())
            .bind(id_i64("category_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<u64, StorageError> {
        let category = id_i64("category_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(category)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let cleared =
            sqlx::query("UPDATE progress_records SET category_id = NULL WHERE category_id = ?1")
                .bind(category)
                .execute(&mut *tx)
                .await
                .map_err(db)?
                .rows_affected();

        tx.commit().await.map_err(db)?;
        Ok(cleared)
    }
}
