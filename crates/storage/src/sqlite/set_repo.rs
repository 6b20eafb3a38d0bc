use std::collections::HashMap;

use coach_core::model::{ProgressRecordId, SetEntry, StoredSet};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{db, db_insert, id_i64, map_set_row, ser};
use crate::repository::{SetEntryRepository, StorageError};

#[async_trait::async_trait]
impl SetEntryRepository for SqliteRepository {
    async fn list_sets(
        &self,
        progress_id: ProgressRecordId,
    ) -> Result<Vec<StoredSet>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, progress_record_id, position, set_type, load, reps, note
                FROM set_entries
                WHERE progress_record_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id_i64("progress_id", progress_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_set_row).collect()
    }

    async fn replace_sets(
        &self,
        progress_id: ProgressRecordId,
        entries: &[SetEntry],
    ) -> Result<(), StorageError> {
        let record = id_i64("progress_id", progress_id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let exists = sqlx::query("SELECT 1 FROM progress_records WHERE id = ?1")
            .bind(record)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM set_entries WHERE progress_record_id = ?1")
            .bind(record)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        for (position, entry) in entries.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("set position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO set_entries (
                        progress_record_id, position, set_type, load, reps, note
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(record)
            .bind(position)
            .bind(entry.kind.as_str())
            .bind(entry.load)
            .bind(entry.reps.to_string())
            .bind(&entry.note)
            .execute(&mut *tx)
            .await
            .map_err(db_insert)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn count_sets(
        &self,
        progress_ids: &[ProgressRecordId],
    ) -> Result<HashMap<ProgressRecordId, u32>, StorageError> {
        if progress_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT progress_record_id, COUNT(*) AS n FROM set_entries WHERE progress_record_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in progress_ids {
            ids.push_bind(id_i64("progress_id", id.value())?);
        }
        ids.push_unseparated(") GROUP BY progress_record_id");

        let rows = query.build().fetch_all(&self.pool).await.map_err(db)?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("progress_record_id").map_err(ser)?;
            let n: i64 = row.try_get("n").map_err(ser)?;
            let id = u64::try_from(id)
                .map_err(|_| StorageError::Serialization("progress_id sign overflow".into()))?;
            let n = u32::try_from(n)
                .map_err(|_| StorageError::Serialization(format!("invalid set count: {n}")))?;
            counts.insert(ProgressRecordId::new(id), n);
        }
        Ok(counts)
    }
}
