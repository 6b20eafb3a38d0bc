use std::fmt;

use chrono::{DateTime, Duration, Utc};
use coach_core::model::{
    CategoryName, ExerciseDetails, ProgressValues, Reps, SetEntry, SetType, StudentProfile,
};
use storage::repository::{NewCategoryRecord, NewProgressRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    student_name: String,
    weeks: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidWeeks { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidWeeks { raw } => write!(f, "invalid --weeks value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("COACH_DB_URL").unwrap_or_else(|_| "sqlite:coach.sqlite3".into());
        let mut student_name =
            std::env::var("COACH_SEED_STUDENT").unwrap_or_else(|_| "Sample Student".into());
        let mut weeks = std::env::var("COACH_SEED_WEEKS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--student" => {
                    student_name = require_value(&mut args, "--student")?;
                }
                "--weeks" => {
                    let value = require_value(&mut args, "--weeks")?;
                    weeks = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidWeeks { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            student_name,
            weeks,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:coach.sqlite3)");
    eprintln!("  --student <name>          Name of the seeded student (default: Sample Student)");
    eprintln!("  --weeks <n>               Weekly history entries per exercise (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  COACH_DB_URL, COACH_SEED_STUDENT, COACH_SEED_WEEKS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let student = storage
        .students
        .insert_student(&StudentProfile::new(args.student_name.clone(), None, None)?)
        .await?;

    let upper = storage
        .categories
        .insert_category(NewCategoryRecord {
            student_id: student,
            name: CategoryName::new("Upper body")?,
            created_at: now,
        })
        .await?;

    let catalog = [
        ("Squat", "Legs", 40.0, false),
        ("Bench press", "Chest", 30.0, true),
        ("Barbell row", "Back", 25.0, true),
        ("Plank", "", 0.0, false),
    ];

    let mut exercises = 0;
    let mut records = 0;
    for (name, group, base_load, in_upper) in catalog {
        let exercise = storage
            .exercises
            .insert_exercise(&ExerciseDetails::new(name, group)?)
            .await?;
        exercises += 1;

        for week in (0..args.weeks).rev() {
            let recorded_at = now - Duration::weeks(i64::from(week));
            let progression = f64::from(args.weeks - week) * 2.5;
            let record = storage
                .progress
                .append_record(NewProgressRecord {
                    student_id: student,
                    exercise_id: exercise,
                    category_id: in_upper.then(|| upper.id()),
                    values: ProgressValues {
                        load: base_load + progression,
                        reps: Reps::Count(10),
                        set_count: 3,
                        note: String::new(),
                    },
                    recorded_at,
                })
                .await?;
            records += 1;

            // The latest week gets per-set rows; older weeks stay on the aggregate.
            if week == 0 {
                let working = SetEntry {
                    kind: SetType::Valid1,
                    load: record.load(),
                    reps: Reps::Count(10),
                    note: String::new(),
                };
                let sets = [
                    SetEntry {
                        kind: SetType::Warmup,
                        load: record.load() / 2.0,
                        reps: Reps::Count(15),
                        note: String::new(),
                    },
                    working.clone(),
                    SetEntry {
                        kind: SetType::Valid2,
                        ..working
                    },
                ];
                storage.sets.replace_sets(record.id(), &sets).await?;
            }
        }
    }

    println!(
        "Seeded student {} with {exercises} exercises and {records} progress records into {}",
        student.value(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
