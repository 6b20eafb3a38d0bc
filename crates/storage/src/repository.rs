use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coach_core::derive::{current_per_exercise, order_history};
use coach_core::model::{
    Category, CategoryId, CategoryName, Exercise, ExerciseDetails, ExerciseId, ProgressRecord,
    ProgressRecordId, ProgressValues, SetEntry, SetEntryId, StoredSet, Student, StudentId,
    StudentProfile,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// A dependent row was left behind by a delete. Indicates a missed
    /// cascade rather than a recoverable condition.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORD SHAPES ─────────────────────────────────────────────────────────────
//

/// Insert shape for a category; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCategoryRecord {
    pub student_id: StudentId,
    pub name: CategoryName,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a progress record; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProgressRecord {
    pub student_id: StudentId,
    pub exercise_id: ExerciseId,
    pub category_id: Option<CategoryId>,
    pub values: ProgressValues,
    pub recorded_at: DateTime<Utc>,
}

/// Optional filters for the global history listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub student_id: Option<StudentId>,
    pub exercise_id: Option<ExerciseId>,
}

impl HistoryFilter {
    #[must_use]
    pub fn matches(&self, record: &ProgressRecord) -> bool {
        self.student_id.is_none_or(|id| record.student_id() == id)
            && self.exercise_id.is_none_or(|id| record.exercise_id() == id)
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn insert_student(&self, profile: &StudentProfile) -> Result<StudentId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing student is `Ok(None)`.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    /// Students ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_students(&self) -> Result<Vec<Student>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn update_student(
        &self,
        id: StudentId,
        profile: &StudentProfile,
    ) -> Result<(), StorageError>;

    /// Deletes the student together with its progress records, their set
    /// rows, and its categories, as one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the exercise cannot be stored.
    async fn insert_exercise(&self, details: &ExerciseDetails)
    -> Result<ExerciseId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing exercise is `Ok(None)`.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError>;

    /// Exercises ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the exercise does not exist.
    async fn update_exercise(
        &self,
        id: ExerciseId,
        details: &ExerciseDetails,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing and `StorageError::Conflict`
    /// while any progress record still references the exercise.
    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning student does not exist.
    async fn insert_category(&self, category: NewCategoryRecord)
    -> Result<Category, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing category is `Ok(None)`.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError>;

    /// Categories of a student, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_categories(&self, student_id: StudentId)
    -> Result<Vec<Category>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist.
    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<(), StorageError>;

    /// Deletes the category row and clears the reference on every record
    /// pointing at it, historical rows included, as one unit. Returns how
    /// many records were cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist. On any
    /// error nothing is changed.
    async fn delete_category(&self, id: CategoryId) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Inserts a new history row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student or exercise does not exist.
    async fn append_record(&self, record: NewProgressRecord)
    -> Result<ProgressRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing record is `Ok(None)`.
    async fn get_record(&self, id: ProgressRecordId)
    -> Result<Option<ProgressRecord>, StorageError>;

    /// History of one (student, exercise) pair, newest first. Records sharing
    /// a timestamp come out in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_history(
        &self,
        student_id: StudentId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.list_records(HistoryFilter {
            student_id: Some(student_id),
            exercise_id: Some(exercise_id),
        })
        .await
    }

    /// Every record of a student across exercises, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_student_history(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.list_records(HistoryFilter {
            student_id: Some(student_id),
            exercise_id: None,
        })
        .await
    }

    /// Records matching `filter`, newest first, ties in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_records(&self, filter: HistoryFilter)
    -> Result<Vec<ProgressRecord>, StorageError>;

    /// The most recent record per exercise for a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_current_per_exercise(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let history = self.list_student_history(student_id).await?;
        Ok(current_per_exercise(history))
    }

    /// Overwrites the measured fields of a record and re-stamps it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn update_latest(
        &self,
        id: ProgressRecordId,
        values: &ProgressValues,
        recorded_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn set_category(
        &self,
        id: ProgressRecordId,
        category_id: Option<CategoryId>,
    ) -> Result<(), StorageError>;

    /// Deletes one record and its set rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn remove_record(&self, id: ProgressRecordId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SetEntryRepository: Send + Sync {
    /// Stored set rows of a record, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sets(&self, progress_id: ProgressRecordId)
    -> Result<Vec<StoredSet>, StorageError>;

    /// Replaces all set rows of a record in one unit; positions follow the
    /// order of `entries`. Either every row is replaced or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn replace_sets(
        &self,
        progress_id: ProgressRecordId,
        entries: &[SetEntry],
    ) -> Result<(), StorageError>;

    /// Number of set rows per record. Records without rows are absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_sets(
        &self,
        progress_ids: &[ProgressRecordId],
    ) -> Result<HashMap<ProgressRecordId, u32>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct State {
    next_id: u64,
    students: BTreeMap<StudentId, Student>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    categories: Vec<Category>,
    /// Insertion order is significant: it breaks timestamp ties.
    records: Vec<ProgressRecord>,
    sets: Vec<StoredSet>,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record_mut(&mut self, id: ProgressRecordId) -> Result<&mut ProgressRecord, StorageError> {
        self.records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(StorageError::NotFound)
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All tables sit behind one lock, so multi-table operations (cascades,
/// set replacement) are applied as a unit.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn insert_student(&self, profile: &StudentProfile) -> Result<StudentId, StorageError> {
        let mut guard = self.lock()?;
        let id = StudentId::new(guard.allocate());
        guard
            .students
            .insert(id, Student::new(id, profile.clone()));
        Ok(id)
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.students.get(&id).cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let guard = self.lock()?;
        let mut students: Vec<_> = guard.students.values().cloned().collect();
        students.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(students)
    }

    async fn update_student(
        &self,
        id: StudentId,
        profile: &StudentProfile,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.students.get_mut(&id).ok_or(StorageError::NotFound)?;
        *slot = Student::new(id, profile.clone());
        Ok(())
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.students.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        let owned: HashSet<ProgressRecordId> = guard
            .records
            .iter()
            .filter(|record| record.student_id() == id)
            .map(ProgressRecord::id)
            .collect();
        guard.sets.retain(|row| !owned.contains(&row.progress_id));
        guard.records.retain(|record| record.student_id() != id);
        guard.categories.retain(|category| category.student_id() != id);
        Ok(())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn insert_exercise(
        &self,
        details: &ExerciseDetails,
    ) -> Result<ExerciseId, StorageError> {
        let mut guard = self.lock()?;
        let id = ExerciseId::new(guard.allocate());
        guard
            .exercises
            .insert(id, Exercise::new(id, details.clone()));
        Ok(id)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.exercises.get(&id).cloned())
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let guard = self.lock()?;
        let mut exercises: Vec<_> = guard.exercises.values().cloned().collect();
        exercises.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(exercises)
    }

    async fn update_exercise(
        &self,
        id: ExerciseId,
        details: &ExerciseDetails,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.exercises.get_mut(&id).ok_or(StorageError::NotFound)?;
        *slot = Exercise::new(id, details.clone());
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.exercises.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        if guard.records.iter().any(|record| record.exercise_id() == id) {
            return Err(StorageError::Conflict(format!(
                "exercise {id} still has progress records"
            )));
        }
        guard.exercises.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn insert_category(
        &self,
        category: NewCategoryRecord,
    ) -> Result<Category, StorageError> {
        let mut guard = self.lock()?;
        if !guard.students.contains_key(&category.student_id) {
            return Err(StorageError::NotFound);
        }
        let id = CategoryId::new(guard.allocate());
        let stored = Category::new(id, category.student_id, category.name, category.created_at);
        guard.categories.push(stored.clone());
        Ok(stored)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.categories.iter().find(|c| c.id() == id).cloned())
    }

    async fn list_categories(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<Category>, StorageError> {
        let guard = self.lock()?;
        let mut categories: Vec<_> = guard
            .categories
            .iter()
            .filter(|c| c.student_id() == student_id)
            .cloned()
            .collect();
        categories.sort_by_key(|c| (c.created_at(), c.id()));
        Ok(categories)
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .categories
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(StorageError::NotFound)?;
        *slot = slot.renamed(name.clone());
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<u64, StorageError> {
        let mut guard = self.lock()?;
        let before = guard.categories.len();
        guard.categories.retain(|c| c.id() != id);
        if guard.categories.len() == before {
            return Err(StorageError::NotFound);
        }
        let mut cleared = 0;
        for record in &mut guard.records {
            if record.category_id() == Some(id) {
                record.set_category(None);
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_record(
        &self,
        record: NewProgressRecord,
    ) -> Result<ProgressRecord, StorageError> {
        let mut guard = self.lock()?;
        if !guard.students.contains_key(&record.student_id)
            || !guard.exercises.contains_key(&record.exercise_id)
        {
            return Err(StorageError::NotFound);
        }
        let id = ProgressRecordId::new(guard.allocate());
        let stored = ProgressRecord::new(
            id,
            record.student_id,
            record.exercise_id,
            record.category_id,
            record.values,
            record.recorded_at,
        );
        guard.records.push(stored.clone());
        Ok(stored)
    }

    async fn get_record(
        &self,
        id: ProgressRecordId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.records.iter().find(|r| r.id() == id).cloned())
    }

    async fn list_records(
        &self,
        filter: HistoryFilter,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        let mut records: Vec<_> = guard
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        order_history(&mut records);
        Ok(records)
    }

    async fn update_latest(
        &self,
        id: ProgressRecordId,
        values: &ProgressValues,
        recorded_at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let mut guard = self.lock()?;
        let record = guard.record_mut(id)?;
        record.refresh(values.clone(), recorded_at);
        Ok(record.clone())
    }

    async fn set_category(
        &self,
        id: ProgressRecordId,
        category_id: Option<CategoryId>,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.record_mut(id)?.set_category(category_id);
        Ok(())
    }

    async fn remove_record(&self, id: ProgressRecordId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let before = guard.records.len();
        guard.records.retain(|r| r.id() != id);
        if guard.records.len() == before {
            return Err(StorageError::NotFound);
        }
        guard.sets.retain(|row| row.progress_id != id);
        Ok(())
    }
}

#[async_trait]
impl SetEntryRepository for InMemoryRepository {
    async fn list_sets(
        &self,
        progress_id: ProgressRecordId,
    ) -> Result<Vec<StoredSet>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<_> = guard
            .sets
            .iter()
            .filter(|row| row.progress_id == progress_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.position);
        Ok(rows)
    }

    async fn replace_sets(
        &self,
        progress_id: ProgressRecordId,
        entries: &[SetEntry],
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.records.iter().any(|r| r.id() == progress_id) {
            return Err(StorageError::NotFound);
        }
        let mut replacement = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let position = u32::try_from(position)
                .map_err(|_| StorageError::Serialization("set position overflow".into()))?;
            replacement.push(StoredSet {
                id: SetEntryId::new(guard.allocate()),
                progress_id,
                position,
                entry: entry.clone(),
            });
        }
        guard.sets.retain(|row| row.progress_id != progress_id);
        guard.sets.extend(replacement);
        Ok(())
    }

    async fn count_sets(
        &self,
        progress_ids: &[ProgressRecordId],
    ) -> Result<HashMap<ProgressRecordId, u32>, StorageError> {
        let guard = self.lock()?;
        let wanted: HashSet<_> = progress_ids.iter().copied().collect();
        let mut counts = HashMap::new();
        for row in guard.sets.iter().filter(|row| wanted.contains(&row.progress_id)) {
            *counts.entry(row.progress_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub sets: Arc<dyn SetEntryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    /// Wires every repository to the same backend value.
    pub fn from_backend<R>(repo: R) -> Self
    where
        R: StudentRepository
            + ExerciseRepository
            + CategoryRepository
            + ProgressRepository
            + SetEntryRepository
            + Clone
            + 'static,
    {
        Self {
            students: Arc::new(repo.clone()),
            exercises: Arc::new(repo.clone()),
            categories: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            sets: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use coach_core::model::{Reps, SetType};
    use coach_core::time::fixed_now;

    async fn seeded() -> (InMemoryRepository, StudentId, ExerciseId) {
        let repo = InMemoryRepository::new();
        let student = repo
            .insert_student(&StudentProfile::new("Ana", None, None).unwrap())
            .await
            .unwrap();
        let exercise = repo
            .insert_exercise(&ExerciseDetails::new("Squat", "Legs").unwrap())
            .await
            .unwrap();
        (repo, student, exercise)
    }

    fn new_record(
        student_id: StudentId,
        exercise_id: ExerciseId,
        load: f64,
        minutes: i64,
    ) -> NewProgressRecord {
        NewProgressRecord {
            student_id,
            exercise_id,
            category_id: None,
            values: ProgressValues {
                load,
                reps: Reps::Count(10),
                set_count: 3,
                note: String::new(),
            },
            recorded_at: fixed_now() + Duration::minutes(minutes),
        }
    }

    fn set(kind: SetType) -> SetEntry {
        SetEntry {
            kind,
            load: 20.0,
            reps: Reps::Count(8),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let (repo, student, exercise) = seeded().await;
        repo.append_record(new_record(student, exercise, 20.0, 0))
            .await
            .unwrap();
        repo.append_record(new_record(student, exercise, 25.0, 10))
            .await
            .unwrap();

        let history = repo.list_history(student, exercise).await.unwrap();
        let loads: Vec<_> = history.iter().map(ProgressRecord::load).collect();
        assert_eq!(loads, vec![25.0, 20.0]);

        let current = repo.list_current_per_exercise(student).await.unwrap();
        assert_eq!(current.len(), 1);
        assert!((current[0].load() - 25.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn append_rejects_unknown_student() {
        let (repo, _, exercise) = seeded().await;
        let err = repo
            .append_record(new_record(StudentId::new(404), exercise, 1.0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn replace_sets_swaps_whole_sequence() {
        let (repo, student, exercise) = seeded().await;
        let record = repo
            .append_record(new_record(student, exercise, 20.0, 0))
            .await
            .unwrap();

        repo.replace_sets(record.id(), &[set(SetType::Warmup), set(SetType::Valid1)])
            .await
            .unwrap();
        repo.replace_sets(record.id(), &[set(SetType::Valid2)])
            .await
            .unwrap();

        let rows = repo.list_sets(record.id()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[0].entry.kind, SetType::Valid2);

        let counts = repo.count_sets(&[record.id()]).await.unwrap();
        assert_eq!(counts.get(&record.id()), Some(&1));
    }

    #[tokio::test]
    async fn remove_record_cascades_only_its_sets() {
        let (repo, student, exercise) = seeded().await;
        let older = repo
            .append_record(new_record(student, exercise, 20.0, 0))
            .await
            .unwrap();
        let newer = repo
            .append_record(new_record(student, exercise, 25.0, 5))
            .await
            .unwrap();
        repo.replace_sets(older.id(), &[set(SetType::Warmup)])
            .await
            .unwrap();
        repo.replace_sets(newer.id(), &[set(SetType::Valid1)])
            .await
            .unwrap();

        repo.remove_record(newer.id()).await.unwrap();

        let history = repo.list_history(student, exercise).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id(), older.id());
        assert!(repo.list_sets(newer.id()).await.unwrap().is_empty());
        assert_eq!(repo.list_sets(older.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_student_cascades() {
        let (repo, student, exercise) = seeded().await;
        let record = repo
            .append_record(new_record(student, exercise, 20.0, 0))
            .await
            .unwrap();
        repo.replace_sets(record.id(), &[set(SetType::Warmup)])
            .await
            .unwrap();
        repo.insert_category(NewCategoryRecord {
            student_id: student,
            name: CategoryName::new("Legs").unwrap(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();

        repo.delete_student(student).await.unwrap();

        assert!(repo.get_record(record.id()).await.unwrap().is_none());
        assert!(repo.list_sets(record.id()).await.unwrap().is_empty());
        assert!(repo.list_categories(student).await.unwrap().is_empty());
        assert!(repo.get_exercise(exercise).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_exercise_in_use_conflicts() {
        let (repo, student, exercise) = seeded().await;
        repo.append_record(new_record(student, exercise, 20.0, 0))
            .await
            .unwrap();
        let err = repo.delete_exercise(exercise).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_category_clears_every_dated_reference() {
        let (repo, student, exercise) = seeded().await;
        let bench = repo
            .insert_exercise(&ExerciseDetails::new("Bench", "Chest").unwrap())
            .await
            .unwrap();
        let legs = repo
            .insert_category(NewCategoryRecord {
                student_id: student,
                name: CategoryName::new("Legs").unwrap(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        for (exercise_id, minutes) in [(exercise, 0), (exercise, 10), (bench, 20)] {
            let mut record = new_record(student, exercise_id, 20.0, minutes);
            record.category_id = Some(legs.id());
            repo.append_record(record).await.unwrap();
        }
        repo.append_record(new_record(student, exercise, 30.0, 30))
            .await
            .unwrap();

        assert_eq!(repo.delete_category(legs.id()).await.unwrap(), 3);

        let records = repo.list_records(HistoryFilter::default()).await.unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.category_id().is_none()));
        assert!(repo.get_category(legs.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_category(legs.id()).await,
            Err(StorageError::NotFound)
        ));
    }
}
