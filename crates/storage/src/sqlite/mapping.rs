use coach_core::model::{
    Category, CategoryId, CategoryName, Exercise, ExerciseDetails, ExerciseId, ProgressRecord,
    ProgressRecordId, ProgressValues, Reps, SetEntry, SetEntryId, SetType, StoredSet, Student,
    StudentId, StudentProfile,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) const PROGRESS_COLUMNS: &str =
    "id, student_id, exercise_id, category_id, load, reps, set_count, note, recorded_at";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a driver error from reads, updates and deletes. A foreign-key
/// failure here means a dependent row survived a delete.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(inner) if inner.is_foreign_key_violation() => {
            StorageError::Integrity(inner.message().to_owned())
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

/// Maps a driver error from inserts, where a foreign-key failure means the
/// referenced parent is gone (a stale id on the caller's side).
pub(crate) fn db_insert(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(inner) if inner.is_foreign_key_violation() => StorageError::NotFound,
        _ => db(e),
    }
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let id = StudentId::new(i64_to_u64("student_id", row.try_get("id").map_err(ser)?)?);
    let profile = StudentProfile::new(
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("email").map_err(ser)?,
        row.try_get::<Option<String>, _>("phone").map_err(ser)?,
    )
    .map_err(ser)?;
    Ok(Student::new(id, profile))
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    let id = ExerciseId::new(i64_to_u64("exercise_id", row.try_get("id").map_err(ser)?)?);
    let details = ExerciseDetails::new(
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("muscle_group").map_err(ser)?,
    )
    .map_err(ser)?;
    Ok(Exercise::new(id, details))
}

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<Category, StorageError> {
    Ok(Category::new(
        CategoryId::new(i64_to_u64("category_id", row.try_get("id").map_err(ser)?)?),
        StudentId::new(i64_to_u64(
            "student_id",
            row.try_get("student_id").map_err(ser)?,
        )?),
        CategoryName::new(row.try_get::<String, _>("name").map_err(ser)?).map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let category_id = row
        .try_get::<Option<i64>, _>("category_id")
        .map_err(ser)?
        .map(|v| i64_to_u64("category_id", v).map(CategoryId::new))
        .transpose()?;
    let reps: String = row.try_get("reps").map_err(ser)?;

    Ok(ProgressRecord::new(
        ProgressRecordId::new(i64_to_u64("progress_id", row.try_get("id").map_err(ser)?)?),
        StudentId::new(i64_to_u64(
            "student_id",
            row.try_get("student_id").map_err(ser)?,
        )?),
        ExerciseId::new(i64_to_u64(
            "exercise_id",
            row.try_get("exercise_id").map_err(ser)?,
        )?),
        category_id,
        ProgressValues {
            load: row.try_get("load").map_err(ser)?,
            reps: Reps::from_stored(&reps),
            set_count: u32_from_i64("set_count", row.try_get("set_count").map_err(ser)?)?,
            note: row.try_get("note").map_err(ser)?,
        },
        row.try_get("recorded_at").map_err(ser)?,
    ))
}

pub(crate) fn map_set_row(row: &SqliteRow) -> Result<StoredSet, StorageError> {
    let kind: String = row.try_get("set_type").map_err(ser)?;
    let reps: String = row.try_get("reps").map_err(ser)?;
    Ok(StoredSet {
        id: SetEntryId::new(i64_to_u64("set_id", row.try_get("id").map_err(ser)?)?),
        progress_id: ProgressRecordId::new(i64_to_u64(
            "progress_record_id",
            row.try_get("progress_record_id").map_err(ser)?,
        )?),
        position: u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
        entry: SetEntry {
            kind: kind.parse::<SetType>().map_err(ser)?,
            load: row.try_get("load").map_err(ser)?,
            reps: Reps::from_stored(&reps),
            note: row.try_get("note").map_err(ser)?,
        },
    })
}
