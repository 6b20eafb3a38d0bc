use chrono::{DateTime, Utc};
use coach_core::model::{CategoryId, ProgressRecord, ProgressRecordId, ProgressValues};

use super::SqliteRepository;
use super::mapping::{PROGRESS_COLUMNS, db, db_insert, id_i64, map_progress_row};
use crate::repository::{HistoryFilter, NewProgressRecord, ProgressRepository, StorageError};

fn opt_id(field: &'static str, v: Option<u64>) -> Result<Option<i64>, StorageError> {
    v.map(|v| id_i64(field, v)).transpose()
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn append_record(
        &self,
        record: NewProgressRecord,
    ) -> Result<ProgressRecord, StorageError> {
        let sql = format!(
            r"
                INSERT INTO progress_records (
                    student_id, exercise_id, category_id, load, reps, set_count, note, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING {PROGRESS_COLUMNS}
            "
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("student_id", record.student_id.value())?)
            .bind(id_i64("exercise_id", record.exercise_id.value())?)
            .bind(opt_id("category_id", record.category_id.map(|id| id.value()))?)
            .bind(record.values.load)
            .bind(record.values.reps.to_string())
            .bind(i64::from(record.values.set_count))
            .bind(&record.values.note)
            .bind(record.recorded_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_insert)?;

        map_progress_row(&row)
    }

    async fn get_record(
        &self,
        id: ProgressRecordId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM progress_records WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("progress_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_records(
        &self,
        filter: HistoryFilter,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        // Rowid order breaks timestamp ties: ids only ever grow.
        let sql = format!(
            r"
                SELECT {PROGRESS_COLUMNS}
                FROM progress_records
                WHERE (?1 IS NULL OR student_id = ?1)
                  AND (?2 IS NULL OR exercise_id = ?2)
                ORDER BY recorded_at DESC, id ASC
            "
        );
        let rows = sqlx::query(&sql)
            .bind(opt_id("student_id", filter.student_id.map(|id| id.value()))?)
            .bind(opt_id("exercise_id", filter.exercise_id.map(|id| id.value()))?)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn update_latest(
        &self,
        id: ProgressRecordId,
        values: &ProgressValues,
        recorded_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let sql = format!(
            r"
                UPDATE progress_records
                SET load = ?1, reps = ?2, set_count = ?3, note = ?4, recorded_at = ?5
                WHERE id = ?6
                RETURNING {PROGRESS_COLUMNS}
            "
        );
        let row = sqlx::query(&sql)
            .bind(values.load)
            .bind(values.reps.to_string())
            .bind(i64::from(values.set_count))
            .bind(&values.note)
            .bind(recorded_at)
            .bind(id_i64("progress_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or(StorageError::NotFound)?;

        map_progress_row(&row)
    }

    async fn set_category(
        &self,
        id: ProgressRecordId,
        category_id: Option<CategoryId>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE progress_records SET category_id = ?1 WHERE id = ?2")
            .bind(opt_id("category_id", category_id.map(|id| id.value()))?)
            .bind(id_i64("progress_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn remove_record(&self, id: ProgressRecordId) -> Result<(), StorageError> {
        let record = id_i64("progress_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query("DELETE FROM set_entries WHERE progress_record_id = ?1")
            .bind(record)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let res = sqlx::query("DELETE FROM progress_records WHERE id = ?1")
            .bind(record)
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
