use chrono::Duration;
use coach_core::model::{
    CategoryName, ExerciseDetails, ProgressValues, Reps, SetEntry, SetType, StudentProfile,
};
use coach_core::time::fixed_now;
use storage::repository::{
    CategoryRepository, ExerciseRepository, HistoryFilter, NewCategoryRecord, NewProgressRecord,
    ProgressRepository, SetEntryRepository, StorageError, StudentRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn values(load: f64, reps: Reps, set_count: u32) -> ProgressValues {
    ProgressValues {
        load,
        reps,
        set_count,
        note: String::new(),
    }
}

fn set(kind: SetType, load: f64, reps: &str) -> SetEntry {
    SetEntry {
        kind,
        load,
        reps: Reps::from_stored(reps),
        note: String::new(),
    }
}

#[tokio::test]
async fn sqlite_history_orders_ties_by_insertion() {
    let repo = connect("memdb_history_ties").await;
    let student = repo
        .insert_student(&StudentProfile::new("Ana", Some("ana@example.com".into()), None).unwrap())
        .await
        .unwrap();
    let squat = repo
        .insert_exercise(&ExerciseDetails::new("Squat", "Legs").unwrap())
        .await
        .unwrap();

    let at = fixed_now();
    let first = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: squat,
            category_id: None,
            values: values(20.0, Reps::Count(10), 3),
            recorded_at: at,
        })
        .await
        .unwrap();
    let second = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: squat,
            category_id: None,
            values: values(22.5, Reps::Text("8-10".into()), 3),
            recorded_at: at,
        })
        .await
        .unwrap();
    let newest = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: squat,
            category_id: None,
            values: values(25.0, Reps::Count(8), 4),
            recorded_at: at + Duration::hours(1),
        })
        .await
        .unwrap();

    let history = repo.list_history(student, squat).await.unwrap();
    let ids: Vec<_> = history.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![newest.id(), first.id(), second.id()]);
    assert_eq!(history[2].reps(), &Reps::Text("8-10".into()));

    let all = repo.list_records(HistoryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let current = repo.list_current_per_exercise(student).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id(), newest.id());
}

#[tokio::test]
async fn sqlite_append_with_stale_ids_is_not_found() {
    let repo = connect("memdb_stale_ids").await;
    let student = repo
        .insert_student(&StudentProfile::new("Bea", None, None).unwrap())
        .await
        .unwrap();

    let err = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: coach_core::model::ExerciseId::new(999),
            category_id: None,
            values: ProgressValues::unrecorded(),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo
        .insert_category(NewCategoryRecord {
            student_id: coach_core::model::StudentId::new(999),
            name: CategoryName::new("Push").unwrap(),
            created_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_update_latest_restamps_in_place() {
    let repo = connect("memdb_update_latest").await;
    let student = repo
        .insert_student(&StudentProfile::new("Caio", None, None).unwrap())
        .await
        .unwrap();
    let press = repo
        .insert_exercise(&ExerciseDetails::new("Bench press", "Chest").unwrap())
        .await
        .unwrap();
    let record = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: press,
            category_id: None,
            values: ProgressValues::unrecorded(),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap();

    let later = fixed_now() + Duration::days(2);
    let updated = repo
        .update_latest(record.id(), &values(40.0, Reps::Count(12), 3), later)
        .await
        .unwrap();
    assert_eq!(updated.id(), record.id());
    assert_eq!(updated.recorded_at(), later);
    assert_eq!(updated.set_count(), 3);
    assert_eq!(repo.list_history(student, press).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_sets_replace_count_and_cascade() {
    let repo = connect("memdb_sets").await;
    let student = repo
        .insert_student(&StudentProfile::new("Duda", None, None).unwrap())
        .await
        .unwrap();
    let row = repo
        .insert_exercise(&ExerciseDetails::new("Row", "Back").unwrap())
        .await
        .unwrap();
    let record = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: row,
            category_id: None,
            values: values(30.0, Reps::Count(10), 3),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap();

    repo.replace_sets(
        record.id(),
        &[
            set(SetType::Warmup, 10.0, "15"),
            set(SetType::Valid1, 30.0, "10"),
            set(SetType::Valid2, 32.5, "until failure"),
        ],
    )
    .await
    .unwrap();

    let rows = repo.list_sets(record.id()).await.unwrap();
    let kinds: Vec<_> = rows.iter().map(|r| r.entry.kind).collect();
    assert_eq!(kinds, vec![SetType::Warmup, SetType::Valid1, SetType::Valid2]);
    assert_eq!(rows[2].entry.reps, Reps::Text("until failure".into()));

    let counts = repo.count_sets(&[record.id()]).await.unwrap();
    assert_eq!(counts.get(&record.id()), Some(&3));

    repo.replace_sets(record.id(), &[]).await.unwrap();
    assert!(repo.count_sets(&[record.id()]).await.unwrap().is_empty());

    repo.replace_sets(record.id(), &[set(SetType::Valid3, 35.0, "6")])
        .await
        .unwrap();
    repo.remove_record(record.id()).await.unwrap();
    assert!(repo.list_sets(record.id()).await.unwrap().is_empty());
    assert!(matches!(
        repo.replace_sets(record.id(), &[]).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_category_clear_and_student_cascade() {
    let repo = connect("memdb_categories").await;
    let student = repo
        .insert_student(&StudentProfile::new("Enzo", None, Some("555-0100".into())).unwrap())
        .await
        .unwrap();
    let curl = repo
        .insert_exercise(&ExerciseDetails::new("Curl", "").unwrap())
        .await
        .unwrap();
    let arms = repo
        .insert_category(NewCategoryRecord {
            student_id: student,
            name: CategoryName::new("Arms").unwrap(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let record = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: curl,
            category_id: Some(arms.id()),
            values: values(12.0, Reps::Count(12), 3),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap();
    repo.replace_sets(record.id(), &[set(SetType::Valid1, 12.0, "12")])
        .await
        .unwrap();

    repo.rename_category(arms.id(), &CategoryName::new("Biceps").unwrap())
        .await
        .unwrap();
    let listed = repo.list_categories(student).await.unwrap();
    assert_eq!(listed[0].name().as_str(), "Biceps");

    assert_eq!(repo.delete_category(arms.id()).await.unwrap(), 1);
    let reloaded = repo.get_record(record.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.category_id(), None);

    assert!(matches!(
        repo.delete_exercise(curl).await,
        Err(StorageError::Conflict(_))
    ));

    repo.delete_student(student).await.unwrap();
    assert!(repo.get_student(student).await.unwrap().is_none());
    assert!(repo.get_record(record.id()).await.unwrap().is_none());
    assert!(repo.list_sets(record.id()).await.unwrap().is_empty());

    repo.delete_exercise(curl).await.unwrap();
    assert!(repo.list_exercises().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_delete_category_clears_all_dated_records() {
    let repo = connect("memdb_category_history").await;
    let student = repo
        .insert_student(&StudentProfile::new("Lia", None, None).unwrap())
        .await
        .unwrap();
    let squat = repo
        .insert_exercise(&ExerciseDetails::new("Squat", "Legs").unwrap())
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
    for hours in [0_i32, 24, 48] {
        repo.append_record(NewProgressRecord {
            student_id: student,
            exercise_id: squat,
            category_id: Some(legs.id()),
            values: values(40.0 + f64::from(hours), Reps::Count(8), 3),
            recorded_at: fixed_now() + Duration::hours(i64::from(hours)),
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.delete_category(legs.id()).await.unwrap(), 3);

    let records = repo.list_records(HistoryFilter::default()).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.category_id().is_none()));
    assert!(matches!(
        repo.delete_category(legs.id()).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_failed_category_delete_changes_nothing() {
    let repo = connect("memdb_category_atomic").await;
    let student = repo
        .insert_student(&StudentProfile::new("Noa", None, None).unwrap())
        .await
        .unwrap();
    let row = repo
        .insert_exercise(&ExerciseDetails::new("Row", "Back").unwrap())
        .await
        .unwrap();
    let back = repo
        .insert_category(NewCategoryRecord {
            student_id: student,
            name: CategoryName::new("Back").unwrap(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let record = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: row,
            category_id: Some(back.id()),
            values: values(50.0, Reps::Count(10), 3),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap();

    sqlx::query(
        r"
            CREATE TRIGGER fail_category_clear
            BEFORE UPDATE ON progress_records
            WHEN NEW.category_id IS NULL
            BEGIN
                SELECT RAISE(ABORT, 'boom');
            END;
        ",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    assert!(repo.delete_category(back.id()).await.is_err());
    assert!(repo.get_category(back.id()).await.unwrap().is_some());
    let reloaded = repo.get_record(record.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.category_id(), Some(back.id()));
}

#[tokio::test]
async fn sqlite_failed_set_replace_keeps_previous_rows() {
    let repo = connect("memdb_sets_atomic").await;
    let student = repo
        .insert_student(&StudentProfile::new("Teo", None, None).unwrap())
        .await
        .unwrap();
    let press = repo
        .insert_exercise(&ExerciseDetails::new("Press", "Shoulders").unwrap())
        .await
        .unwrap();
    let record = repo
        .append_record(NewProgressRecord {
            student_id: student,
            exercise_id: press,
            category_id: None,
            values: values(20.0, Reps::Count(10), 2),
            recorded_at: fixed_now(),
        })
        .await
        .unwrap();
    repo.replace_sets(
        record.id(),
        &[set(SetType::Warmup, 10.0, "12"), set(SetType::Valid1, 20.0, "10")],
    )
    .await
    .unwrap();

    sqlx::query(
        r"
            CREATE TRIGGER fail_heavy_set
            BEFORE INSERT ON set_entries
            WHEN NEW.load = 99
            BEGIN
                SELECT RAISE(ABORT, 'boom');
            END;
        ",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let result = repo
        .replace_sets(
            record.id(),
            &[set(SetType::Valid1, 1.0, "5"), set(SetType::Valid2, 99.0, "5")],
        )
        .await;
    assert!(result.is_err());

    let rows = repo.list_sets(record.id()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].entry.kind, SetType::Warmup);
    assert!((rows[1].entry.load - 20.0).abs() < f64::EPSILON);
}
