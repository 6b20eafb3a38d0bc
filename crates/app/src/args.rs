use std::fmt;

use coach_core::model::{CategoryId, ExerciseId, ProgressRecordId, SetDraft, SetType, StudentId};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidSet { raw: String },
    ConflictingFlags { a: &'static str, b: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSet { raw } => {
                write!(f, "invalid --set value (expected type:load:reps[:note]): {raw}")
            }
            ArgsError::ConflictingFlags { a, b } => write!(f, "{a} and {b} cannot be combined"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Board,
    History,
    Record,
    Update,
    Remove,
    Sets,
    EditSets,
    Categories,
    AddCategory,
    RenameCategory,
    DeleteCategory,
    Move,
    Students,
    AddStudent,
    UpdateStudent,
    DeleteStudent,
    Exercises,
    AddExercise,
    UpdateExercise,
    DeleteExercise,
    Assign,
    Available,
}

impl Command {
    pub fn from_arg(arg: &str) -> Option<Self> {
        Some(match arg {
            "board" => Self::Board,
            "history" => Self::History,
            "record" => Self::Record,
            "update" => Self::Update,
            "remove" => Self::Remove,
            "sets" => Self::Sets,
            "edit-sets" => Self::EditSets,
            "categories" => Self::Categories,
            "add-category" => Self::AddCategory,
            "rename-category" => Self::RenameCategory,
            "delete-category" => Self::DeleteCategory,
            "move" => Self::Move,
            "students" => Self::Students,
            "add-student" => Self::AddStudent,
            "update-student" => Self::UpdateStudent,
            "delete-student" => Self::DeleteStudent,
            "exercises" => Self::Exercises,
            "add-exercise" => Self::AddExercise,
            "update-exercise" => Self::UpdateExercise,
            "delete-exercise" => Self::DeleteExercise,
            "assign" => Self::Assign,
            "available" => Self::Available,
            _ => return None,
        })
    }
}

/// Flags shared by every command. Which ones are required depends on the
/// command and is checked at dispatch.
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub db_url: String,
    pub json: bool,
    pub verbose: bool,
    pub help: bool,
    pub student_id: Option<StudentId>,
    pub exercise_id: Option<ExerciseId>,
    pub category_id: Option<CategoryId>,
    pub record_id: Option<ProgressRecordId>,
    pub uncategorized: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub group: Option<String>,
    pub term: Option<String>,
    pub load: Option<String>,
    pub reps: Option<String>,
    pub sets: Option<String>,
    pub note: Option<String>,
    pub set_drafts: Vec<SetDraft>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse::<T>()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

/// `type:load:reps[:note]`, e.g. `warmup:20:15` or `valid_1:40:8-10:slow`.
pub fn parse_set(raw: &str) -> Result<SetDraft, ArgsError> {
    let invalid = || ArgsError::InvalidSet {
        raw: raw.to_owned(),
    };
    let mut parts = raw.splitn(4, ':');
    let kind = parts
        .next()
        .and_then(|kind| kind.parse::<SetType>().ok())
        .ok_or_else(invalid)?;
    let load = parts.next().ok_or_else(invalid)?.to_owned();
    let reps = parts.next().ok_or_else(invalid)?.to_owned();
    let note = parts.next().unwrap_or_default().to_owned();
    Ok(SetDraft {
        kind,
        load,
        reps,
        note,
    })
}

impl Args {
    pub fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("COACH_DB_URL")
                .unwrap_or_else(|_| "sqlite://coach.sqlite3".into()),
            student_id: std::env::var("COACH_STUDENT_ID")
                .ok()
                .and_then(|value| value.parse::<StudentId>().ok()),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = value;
                }
                "--json" => parsed.json = true,
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => parsed.help = true,
                "--student-id" => {
                    let value = require_value(args, "--student-id")?;
                    parsed.student_id = Some(parse_id("--student-id", value)?);
                }
                "--exercise-id" => {
                    let value = require_value(args, "--exercise-id")?;
                    parsed.exercise_id = Some(parse_id("--exercise-id", value)?);
                }
                "--category-id" => {
                    let value = require_value(args, "--category-id")?;
                    parsed.category_id = Some(parse_id("--category-id", value)?);
                }
                "--record-id" => {
                    let value = require_value(args, "--record-id")?;
                    parsed.record_id = Some(parse_id("--record-id", value)?);
                }
                "--uncategorized" => parsed.uncategorized = true,
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--phone" => parsed.phone = Some(require_value(args, "--phone")?),
                "--group" => parsed.group = Some(require_value(args, "--group")?),
                "--term" => parsed.term = Some(require_value(args, "--term")?),
                "--load" => parsed.load = Some(require_value(args, "--load")?),
                "--reps" => parsed.reps = Some(require_value(args, "--reps")?),
                "--sets" => parsed.sets = Some(require_value(args, "--sets")?),
                "--note" => parsed.note = Some(require_value(args, "--note")?),
                "--set" => {
                    let value = require_value(args, "--set")?;
                    parsed.set_drafts.push(parse_set(&value)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if parsed.uncategorized && parsed.category_id.is_some() {
            return Err(ArgsError::ConflictingFlags {
                a: "--uncategorized",
                b: "--category-id",
            });
        }

        Ok(parsed)
    }

    pub fn student_id(&self) -> Result<StudentId, ArgsError> {
        self.student_id.ok_or(ArgsError::MissingFlag {
            flag: "--student-id",
        })
    }

    pub fn exercise_id(&self) -> Result<ExerciseId, ArgsError> {
        self.exercise_id.ok_or(ArgsError::MissingFlag {
            flag: "--exercise-id",
        })
    }

    pub fn category_id(&self) -> Result<CategoryId, ArgsError> {
        self.category_id.ok_or(ArgsError::MissingFlag {
            flag: "--category-id",
        })
    }

    pub fn record_id(&self) -> Result<ProgressRecordId, ArgsError> {
        self.record_id.ok_or(ArgsError::MissingFlag {
            flag: "--record-id",
        })
    }

    pub fn name(&self) -> Result<String, ArgsError> {
        self.name
            .clone()
            .ok_or(ArgsError::MissingFlag { flag: "--name" })
    }
}
