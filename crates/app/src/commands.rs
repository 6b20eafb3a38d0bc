use std::error::Error;

use serde::Serialize;

use coach_core::board::Board;
use coach_core::derive::DisplayValues;
use coach_core::model::{LoadedSets, ProgressDraft, ProgressRecord};
use services::{AppServices, BoardRow};
use storage::repository::HistoryFilter;

use crate::args::{Args, Command};

type CommandResult = Result<(), Box<dyn Error>>;

fn emit<T: Serialize>(args: &Args, value: &T, text: impl FnOnce(&T) -> String) -> CommandResult {
    if args.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

fn render_values(display: &DisplayValues) -> String {
    format!(
        "load {:>6}  reps {:>8}  sets {:>3}",
        or_dash(display.load),
        or_dash(display.reps.as_ref()),
        or_dash(display.sets),
    )
}

fn render_board(board: &Board<BoardRow>) -> String {
    let mut out = String::new();
    for bucket in board.buckets() {
        let title = bucket
            .category
            .as_ref()
            .map_or("Uncategorized", |category| category.name().as_str());
        out.push_str(&format!("[{title}]\n"));
        if bucket.items.is_empty() {
            out.push_str("  (empty)\n");
        }
        for row in &bucket.items {
            let name = row
                .exercise
                .as_ref()
                .map_or_else(|| format!("exercise {}", row.view.record.exercise_id()), |e| {
                    e.name().to_owned()
                });
            out.push_str(&format!(
                "  #{:<5} {:<24} {}\n",
                row.view.record.id(),
                name,
                render_values(&row.view.display)
            ));
        }
    }
    out.trim_end().to_owned()
}

fn render_history(records: &[ProgressRecord]) -> String {
    if records.is_empty() {
        return "no records".to_owned();
    }
    records
        .iter()
        .map(|record| {
            let display =
                DisplayValues::from_parts(record.load(), record.reps(), record.set_count());
            format!(
                "#{:<5} {}  student {} exercise {}  {}{}",
                record.id(),
                record.recorded_at().format("%Y-%m-%d %H:%M"),
                record.student_id(),
                record.exercise_id(),
                render_values(&display),
                if record.note().is_empty() {
                    String::new()
                } else {
                    format!("  ({})", record.note())
                }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sets(loaded: &LoadedSets) -> String {
    let mut out = format!("source: {:?}\n", loaded.source);
    for (position, entry) in loaded.entries.iter().enumerate() {
        out.push_str(&format!(
            "  {position:>2}. {:<12} load {:>6}  reps {}{}\n",
            entry.kind.as_str(),
            entry.load,
            entry.reps,
            if entry.note.is_empty() {
                String::new()
            } else {
                format!("  ({})", entry.note)
            }
        ));
    }
    out.trim_end().to_owned()
}

fn draft(args: &Args) -> ProgressDraft {
    ProgressDraft {
        load: args.load.clone(),
        reps: args.reps.clone(),
        set_count: args.sets.clone(),
        note: args.note.clone(),
    }
}

#[allow(clippy::too_many_lines)]
pub async fn dispatch(command: Command, args: &Args, services: &AppServices) -> CommandResult {
    match command {
        Command::Board => {
            let board = services.board().get_current_board(args.student_id()?).await?;
            emit(args, &board, render_board)
        }
        Command::History => {
            let filter = HistoryFilter {
                student_id: args.student_id,
                exercise_id: args.exercise_id,
            };
            let records = services.progress().list_history(filter).await?;
            emit(args, &records, |r| render_history(r))
        }
        Command::Record => {
            let record = services
                .progress()
                .record_progress(
                    args.student_id()?,
                    args.exercise_id()?,
                    args.category_id,
                    draft(args),
                )
                .await?;
            emit(args, &record, |r| format!("recorded #{}", r.id()))
        }
        Command::Update => {
            let record = services
                .progress()
                .update_latest(args.record_id()?, draft(args))
                .await?;
            emit(args, &record, |r| format!("updated #{}", r.id()))
        }
        Command::Remove => {
            let id = args.record_id()?;
            services.progress().remove(id).await?;
            emit(args, &id, |id| format!("removed #{id}"))
        }
        Command::Sets => {
            let loaded = services.sets().load_sets(args.record_id()?).await?;
            emit(args, &loaded, render_sets)
        }
        Command::EditSets => {
            let loaded = services
                .sets()
                .edit_sets(args.record_id()?, args.set_drafts.clone())
                .await?;
            emit(args, &loaded, render_sets)
        }
        Command::Categories => {
            let categories = services.categories().list(args.student_id()?).await?;
            emit(args, &categories, |list| {
                list.iter()
                    .map(|c| format!("#{:<5} {}", c.id(), c.name().as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::AddCategory => {
            let category = services
                .categories()
                .create(args.student_id()?, &args.name()?)
                .await?;
            emit(args, &category, |c| format!("created category #{}", c.id()))
        }
        Command::RenameCategory => {
            let id = args.category_id()?;
            services.categories().rename(id, &args.name()?).await?;
            emit(args, &id, |id| format!("renamed category #{id}"))
        }
        Command::DeleteCategory => {
            let cleared = services
                .categories()
                .delete_category(args.category_id()?)
                .await?;
            emit(args, &cleared, |n| format!("deleted category, {n} records uncategorized"))
        }
        Command::Move => {
            let target = if args.uncategorized {
                None
            } else {
                Some(args.category_id()?)
            };
            let outcome = services
                .categories()
                .move_exercise(args.record_id()?, target)
                .await?;
            emit(args, &outcome, |o| format!("{o:?}"))
        }
        Command::Students => {
            let students = services.roster().list_students().await?;
            emit(args, &students, |list| {
                list.iter()
                    .map(|s| {
                        format!(
                            "#{:<5} {:<24} {} {}",
                            s.id(),
                            s.name(),
                            s.profile().email().unwrap_or("-"),
                            s.profile().phone().unwrap_or("-")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::AddStudent => {
            let id = services
                .roster()
                .create_student(args.name()?, args.email.clone(), args.phone.clone())
                .await?;
            emit(args, &id, |id| format!("created student #{id}"))
        }
        Command::UpdateStudent => {
            let id = args.student_id()?;
            services
                .roster()
                .update_student(id, args.name()?, args.email.clone(), args.phone.clone())
                .await?;
            emit(args, &id, |id| format!("updated student #{id}"))
        }
        Command::DeleteStudent => {
            let id = args.student_id()?;
            services.roster().delete_student(id).await?;
            emit(args, &id, |id| format!("deleted student #{id}"))
        }
        Command::Exercises => {
            let groups = services.roster().exercises_by_muscle_group().await?;
            emit(args, &groups, |groups| {
                let mut out = String::new();
                for group in groups {
                    out.push_str(&format!("[{}]\n", group.label));
                    for exercise in &group.exercises {
                        out.push_str(&format!("  #{:<5} {}\n", exercise.id(), exercise.name()));
                    }
                }
                out.trim_end().to_owned()
            })
        }
        Command::AddExercise => {
            let id = services
                .roster()
                .create_exercise(args.name()?, args.group.clone().unwrap_or_default())
                .await?;
            emit(args, &id, |id| format!("created exercise #{id}"))
        }
        Command::UpdateExercise => {
            let id = args.exercise_id()?;
            services
                .roster()
                .update_exercise(id, args.name()?, args.group.clone().unwrap_or_default())
                .await?;
            emit(args, &id, |id| format!("updated exercise #{id}"))
        }
        Command::DeleteExercise => {
            let id = args.exercise_id()?;
            services.roster().delete_exercise(id).await?;
            emit(args, &id, |id| format!("deleted exercise #{id}"))
        }
        Command::Assign => {
            let record = services
                .progress()
                .assign_exercise(args.student_id()?, args.exercise_id()?, args.category_id)
                .await?;
            emit(args, &record, |r| format!("assigned as #{}", r.id()))
        }
        Command::Available => {
            let term = args.term.as_deref().unwrap_or_default();
            let found = services
                .progress()
                .available_exercises(args.student_id()?, term)
                .await?;
            emit(args, &found, |list| {
                if list.is_empty() {
                    return "nothing to add".to_owned();
                }
                list.iter()
                    .map(|e| format!("#{:<5} {:<24} {}", e.id(), e.name(), e.muscle_group()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

