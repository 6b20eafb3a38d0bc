use std::fmt;

use services::{AppServices, Clock};

mod args;
mod commands;

use args::{Args, ArgsError, Command};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- <command> [options]");
    eprintln!();
    eprintln!("Board and history:");
    eprintln!("  board            --student-id <id>");
    eprintln!("  history          [--student-id <id>] [--exercise-id <id>]");
    eprintln!("  record           --student-id <id> --exercise-id <id> [--category-id <id>]");
    eprintln!("                   [--load <n>] [--reps <text>] [--sets <n>] [--note <text>]");
    eprintln!("  update           --record-id <id> --load <n> --reps <text> --sets <n> [--note <text>]");
    eprintln!("  remove           --record-id <id>");
    eprintln!("  sets             --record-id <id>");
    eprintln!("  edit-sets        --record-id <id> [--set <type:load:reps[:note]>]...");
    eprintln!();
    eprintln!("Categories:");
    eprintln!("  categories       --student-id <id>");
    eprintln!("  add-category     --student-id <id> --name <text>");
    eprintln!("  rename-category  --category-id <id> --name <text>");
    eprintln!("  delete-category  --category-id <id>");
    eprintln!("  move             --record-id <id> (--category-id <id> | --uncategorized)");
    eprintln!();
    eprintln!("Roster:");
    eprintln!("  students | exercises");
    eprintln!("  add-student      --name <text> [--email <text>] [--phone <text>]");
    eprintln!("  update-student   --student-id <id> --name <text> [--email <text>] [--phone <text>]");
    eprintln!("  delete-student   --student-id <id>");
    eprintln!("  add-exercise     --name <text> [--group <text>]");
    eprintln!("  update-exercise  --exercise-id <id> --name <text> [--group <text>]");
    eprintln!("  delete-exercise  --exercise-id <id>");
    eprintln!("  assign           --student-id <id> --exercise-id <id> [--category-id <id>]");
    eprintln!("  available        --student-id <id> [--term <text>]");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite://coach.sqlite3)");
    eprintln!("  --json              Print results as JSON");
    eprintln!("  -v, --verbose       Debug logging (overridden by COACH_LOG)");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COACH_DB_URL, COACH_STUDENT_ID, COACH_LOG");
}

#[derive(Debug)]
struct SetupError(String);

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SetupError {}

fn init_tracing(verbose: bool) -> Result<(), SetupError> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("COACH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| SetupError(format!("failed to initialize tracing subscriber: {error}")))
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = argv.into_iter();

    let command = match iter.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown command: {first}");
            print_usage();
            ArgsError::UnknownCommand(first.clone())
        })?,
    };

    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if parsed.help {
        print_usage();
        return Ok(());
    }

    init_tracing(parsed.verbose)?;

    let db_url = normalize_sqlite_url(parsed.db_url.clone());
    prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, ?command, "opening database");
    let services = AppServices::new_sqlite(&db_url, Clock::System).await?;

    commands::dispatch(command, &parsed, &services).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // Binary glue: print once at the top.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
