use std::sync::Arc;

use tracing::{debug, info, warn};

use coach_core::model::{LoadedSets, ProgressRecord, ProgressRecordId, SetDraft};
use storage::repository::{ProgressRepository, SetEntryRepository, StorageError};

use crate::error::SetServiceError;

/// Per-set detail of a progress record, with the legacy fallback applied.
#[derive(Clone)]
pub struct SetService {
    progress: Arc<dyn ProgressRepository>,
    sets: Arc<dyn SetEntryRepository>,
}

impl SetService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>, sets: Arc<dyn SetEntryRepository>) -> Self {
        Self { progress, sets }
    }

    /// Sets to show for a record: stored rows when any exist, otherwise the
    /// sequence implied by the record's aggregate fields.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` if the record does not exist.
    pub async fn load_sets(
        &self,
        record_id: ProgressRecordId,
    ) -> Result<LoadedSets, SetServiceError> {
        let record = self.record(record_id).await?;
        let stored = self.sets.list_sets(record_id).await?;
        let loaded = LoadedSets::resolve(&record, stored);
        debug!(record = %record_id, source = ?loaded.source, len = loaded.entries.len(), "loaded sets");
        Ok(loaded)
    }

    /// Replace every set of a record with the edited sequence. Nothing is
    /// written unless the whole sequence validates.
    ///
    /// # Errors
    ///
    /// Returns `SetServiceError::Sets` naming the first invalid position,
    /// `Storage(NotFound)` if the record does not exist.
    pub async fn edit_sets(
        &self,
        record_id: ProgressRecordId,
        drafts: Vec<SetDraft>,
    ) -> Result<LoadedSets, SetServiceError> {
        let entries = SetDraft::validate_all(drafts)?;

        if let Err(err) = self.sets.replace_sets(record_id, &entries).await {
            warn!(record = %record_id, error = %err, "set replacement failed");
            return Err(err.into());
        }
        info!(record = %record_id, sets = entries.len(), "replaced sets");

        self.load_sets(record_id).await
    }

    async fn record(&self, record_id: ProgressRecordId) -> Result<ProgressRecord, SetServiceError> {
        Ok(self
            .progress
            .get_record(record_id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use coach_core::model::{
        ExerciseDetails, MAX_SET_COUNT, ProgressValues, Reps, SetEntryError, SetSource, SetType,
        StudentProfile,
    };
    use coach_core::time::fixed_now;
    use storage::repository::{NewProgressRecord, Storage};

    use crate::ErrorKind;

    async fn legacy_record(storage: &Storage, set_count: u32) -> ProgressRecordId {
        let student = storage
            .students
            .insert_student(&StudentProfile::new("Ana", None, None).unwrap())
            .await
            .unwrap();
        let exercise = storage
            .exercises
            .insert_exercise(&ExerciseDetails::new("Deadlift", "Back").unwrap())
            .await
            .unwrap();
        storage
            .progress
            .append_record(NewProgressRecord {
                student_id: student,
                exercise_id: exercise,
                category_id: None,
                values: ProgressValues {
                    load: 40.0,
                    reps: Reps::Count(10),
                    set_count,
                    note: String::new(),
                },
                recorded_at: fixed_now(),
            })
            .await
            .unwrap()
            .id()
    }

    fn draft(kind: SetType, load: &str, reps: &str) -> SetDraft {
        SetDraft {
            kind,
            load: load.into(),
            reps: reps.into(),
            note: String::new(),
        }
    }

    fn service(storage: &Storage) -> SetService {
        SetService::new(Arc::clone(&storage.progress), Arc::clone(&storage.sets))
    }

    #[tokio::test]
    async fn legacy_record_expands_to_valid_sets() {
        let storage = Storage::in_memory();
        let id = legacy_record(&storage, 3).await;

        let loaded = service(&storage).load_sets(id).await.unwrap();
        assert_eq!(loaded.source, SetSource::Legacy);
        assert_eq!(loaded.entries.len(), 3);
        for entry in &loaded.entries {
            assert_eq!(entry.kind, SetType::Valid1);
            assert!((entry.load - 40.0).abs() < f64::EPSILON);
            assert_eq!(entry.reps, Reps::Count(10));
        }
    }

    #[tokio::test]
    async fn edit_sets_rejects_whole_sequence_on_empty_reps() {
        let storage = Storage::in_memory();
        let id = legacy_record(&storage, 2).await;
        let service = service(&storage);

        let err = service
            .edit_sets(
                id,
                vec![
                    draft(SetType::Warmup, "20", "12"),
                    draft(SetType::Valid1, "40", "  "),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SetServiceError::Sets(SetEntryError::Reps { position: 1, .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(service.load_sets(id).await.unwrap().source, SetSource::Legacy);
    }

    #[tokio::test]
    async fn edit_sets_stores_order_and_free_text() {
        let storage = Storage::in_memory();
        let id = legacy_record(&storage, 3).await;

        let loaded = service(&storage)
            .edit_sets(
                id,
                vec![
                    draft(SetType::Preparation, "30", "6"),
                    draft(SetType::Valid3, "abc", "until failure"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(loaded.source, SetSource::Detailed);
        assert_eq!(loaded.entries[0].kind, SetType::Preparation);
        assert!(loaded.entries[1].load.abs() < f64::EPSILON);
        assert_eq!(loaded.entries[1].reps, Reps::Text("until failure".into()));
    }

    #[tokio::test]
    async fn clearing_sets_falls_back_to_legacy_or_nothing() {
        let storage = Storage::in_memory();
        let with_legacy = legacy_record(&storage, 3).await;
        let without = legacy_record(&storage, 0).await;
        let service = service(&storage);

        for id in [with_legacy, without] {
            service
                .edit_sets(id, vec![draft(SetType::Valid1, "1", "1")])
                .await
                .unwrap();
            service.edit_sets(id, Vec::new()).await.unwrap();
        }

        assert_eq!(service.load_sets(with_legacy).await.unwrap().entries.len(), 3);
        assert!(service.load_sets(without).await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn huge_legacy_count_expands_to_capped_sets() {
        let storage = Storage::in_memory();
        let id = legacy_record(&storage, u32::MAX).await;

        let loaded = service(&storage).load_sets(id).await.unwrap();
        assert_eq!(loaded.source, SetSource::Legacy);
        assert_eq!(loaded.entries.len(), MAX_SET_COUNT as usize);
    }

    #[tokio::test]
    async fn edit_sets_rejects_more_than_the_cap() {
        let storage = Storage::in_memory();
        let id = legacy_record(&storage, 3).await;
        let drafts = vec![draft(SetType::Valid1, "10", "5"); MAX_SET_COUNT as usize + 1];

        let err = service(&storage).edit_sets(id, drafts).await.unwrap_err();
        assert!(matches!(
            err,
            SetServiceError::Sets(SetEntryError::TooMany { .. })
        ));
        assert_eq!(service(&storage).load_sets(id).await.unwrap().entries.len(), 3);
    }

    #[tokio::test]
    async fn load_sets_of_missing_record_is_not_found() {
        let storage = Storage::in_memory();
        let err = service(&storage)
            .load_sets(ProgressRecordId::new(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
