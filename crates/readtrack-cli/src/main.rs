use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::json;

use readtrack_core::dates::{format_display_date, parse_iso_date};
use readtrack_core::{
    validate_target, AppConfig, BookId, Database, ExitCode, Isbn13, NewBook, ReadingTracker, TrackerError, User,
};
use readtrack_lookup::{BookMetadataSource, LookupError, OpenLibrarySource};

mod logging;
mod render;

const USER_ENV: &str = "READTRACK_USER";
const PASSWORD_ENV: &str = "READTRACK_PASSWORD";

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "readtrack",
    about = "Track the books you are reading and when you will finish them",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting READTRACK_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Account name. Falls back to READTRACK_USER.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Account password. Falls back to READTRACK_PASSWORD.
    #[arg(long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account for --user with --password.
    Register {
        /// Password again.
        #[arg(long)]
        confirm: String,
    },

    /// Start tracking a book by ISBN-13, looking it up on Open Library if needed.
    Add {
        isbn: String,
        /// Finish-by date (YYYY-MM-DD), after today.
        #[arg(long)]
        target: Option<String>,
    },

    /// List current books with progress.
    List,

    /// Show progress, pace and projections for one current book.
    Show { book_id: BookId },

    /// Record the page reached. The first update marks the start date.
    Update { book_id: BookId, page: u32 },

    /// Set or clear the finish-by date of a current book.
    Target {
        book_id: BookId,
        #[arg(required_unless_present = "clear")]
        date: Option<String>,
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },

    /// Mark a started book as finished today.
    Complete { book_id: BookId },

    /// Stop tracking a book without recording it.
    Remove { book_id: BookId },

    /// Finished books and lifetime statistics.
    History,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run diagnostics.
    Doctor,

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("READTRACK_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output, start) {
        let code = exit_code(&err);
        if json_output {
            let envelope = json!({
                "status": "error",
                "error": code.name(),
                "message": format!("{err:#}"),
                "meta": { "duration_ms": start.elapsed().as_millis() }
            });
            if print_json(&envelope).is_err() {
                eprintln!("Error: {err:#}");
            }
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(code as i32);
    }
}

fn run(cli: Cli, json_output: bool, start: Instant) -> Result<()> {
    let Cli { command, user, password, .. } = cli;

    // Load config (honors READTRACK_DATA_DIR if set)
    let mut config = AppConfig::load()?;
    if let Ok(data_dir) = std::env::var("READTRACK_DATA_DIR") {
        config.set_data_dir(data_dir.into());
    }
    logging::init_tracing(&config.logging.level);

    let today = Local::now().date_naive();
    let creds = Credentials::resolve(user, password);

    match command {
        Commands::Register { confirm } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let (name, pw) = creds.require()?;
            let account = tracker.register(name, pw, &confirm)?;

            respond(json_output, start, json!({ "user": account }), || {
                println!("Registered {}", account.username);
            })?;
        }

        // ── Current books ──────────────────────────────────────────────────

        Commands::Add { isbn, target } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;

            let isbn = Isbn13::parse(&isbn)?;
            let target = target.as_deref().map(parse_date).transpose()?;
            if let Some(target) = target {
                validate_target(target, today)?;
            }
            if tracker.current_by_isbn(account.id, &isbn)?.is_some() {
                return Err(TrackerError::AlreadyReading(isbn.to_string()).into());
            }

            let book = match tracker.find_book(&isbn)? {
                Some(book) => book,
                None => {
                    let found = lookup_book(&config, &isbn)?.ok_or_else(|| {
                        TrackerError::BookNotFound(format!("unable to find a book with ISBN {isbn}"))
                    })?;
                    tracker.catalog_book(&found)?
                }
            };
            let record = tracker.start_tracking(account.id, book.id, target, today)?;

            respond(json_output, start, json!(record), || {
                println!("Added {} by {} (id {})", record.book.title, record.book.author, record.book.id);
            })?;
        }

        Commands::List => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let books = tracker.current_books(account.id)?;

            respond(json_output, start, json!({ "items": books, "total": books.len() }), || {
                if books.is_empty() {
                    println!("No current books. Use `readtrack add <isbn>` to start one.");
                } else {
                    for book in &books {
                        println!("{}", render::current_line(book));
                    }
                }
            })?;
        }

        Commands::Show { book_id } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let view = tracker.dashboard(account.id, book_id, today, &config.fixed_rates())?;

            respond(json_output, start, json!(view), || println!("{}", render::dashboard(&view)))?;
        }

        Commands::Update { book_id, page } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let record = tracker.update_page(account.id, book_id, page, today)?;

            respond(json_output, start, json!(record), || {
                println!("{}: page {} of {}", record.book.title, page, record.book.pages);
            })?;
        }

        Commands::Target { book_id, date, clear } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let target = if clear { None } else { date.as_deref().map(parse_date).transpose()? };
            let record = tracker.set_target(account.id, book_id, target, today)?;

            respond(json_output, start, json!(record), || match record.target_date {
                Some(date) => println!(
                    "{}: target set to {}",
                    record.book.title,
                    format_display_date(date)
                ),
                None => println!("{}: target cleared", record.book.title),
            })?;
        }

        Commands::Complete { book_id } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let entry = tracker.complete(account.id, book_id, today)?;

            respond(json_output, start, json!(entry), || {
                println!(
                    "Completed {} in {} days ({:.1} pages/day)",
                    entry.book.title, entry.days, entry.rate
                );
            })?;
        }

        Commands::Remove { book_id } => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            tracker.remove(account.id, book_id)?;

            respond(json_output, start, json!({ "removed": book_id }), || {
                println!("Removed book {book_id}");
            })?;
        }

        // ── History ────────────────────────────────────────────────────────

        Commands::History => {
            let db = open_db(&config)?;
            let tracker = ReadingTracker::new(&db);
            let account = login(&tracker, &creds)?;
            let history = tracker.history(account.id, today)?;

            respond(json_output, start, json!(history), || {
                if history.entries.is_empty() {
                    println!("No finished books yet.");
                } else {
                    for entry in &history.entries {
                        println!("{}", render::history_line(entry));
                    }
                }
                println!();
                println!("{}", render::stats(&history.stats));
            })?;
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => {
            let kv = config_key_values(&config);
            match action {
                ConfigAction::List => {
                    respond(json_output, start, json!(kv), || {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    })?;
                }
                ConfigAction::Get { key } => {
                    let Some(val) = kv.get(key.as_str()) else {
                        return Err(TrackerError::Validation(format!("unknown config key: {key}")).into());
                    };
                    respond(json_output, start, json!({ "key": key, "value": val }), || println!("{val}"))?;
                }
            }
        }

        // ── Doctor ─────────────────────────────────────────────────────────

        Commands::Doctor => {
            let config_path = AppConfig::config_path();
            let db_path = config.database_path();
            let cache_dir = config.cache_dir();
            let mut issues = 0;

            let database = match open_db(&config) {
                Ok(db) => {
                    let books = db.count_books().unwrap_or(0);
                    let versions = db.schema_versions().unwrap_or_default();
                    json!({ "ok": true, "books": books, "schema_versions": versions })
                }
                Err(e) => {
                    issues += 1;
                    json!({ "ok": false, "error": format!("{e:#}") })
                }
            };

            let data = json!({
                "config": { "path": config_path, "exists": config_path.exists() },
                "database": { "path": db_path, "status": database },
                "cache": { "path": cache_dir, "exists": cache_dir.exists() },
                "issues": issues,
            });
            respond(json_output, start, data, || {
                if config_path.exists() {
                    println!("✓ Config: {}", config_path.display());
                } else {
                    println!("○ Config: not found (using defaults)");
                }
                if database["ok"] == true {
                    println!("✓ Database: {} ({} books)", db_path.display(), database["books"]);
                } else {
                    println!("✗ Database: {}", database["error"]);
                }
                if cache_dir.exists() {
                    println!("✓ Lookup cache: {}", cache_dir.display());
                } else {
                    println!("○ Lookup cache: not created yet");
                }
                if issues == 0 {
                    println!("\nAll checks passed ✓");
                } else {
                    println!("\n{issues} issues found");
                }
            })?;
            if issues > 0 {
                std::process::exit(ExitCode::GeneralError as i32);
            }
        }

        // ── Version ────────────────────────────────────────────────────────

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            respond(json_output, start, json!({ "version": version }), || {
                println!("readtrack v{version}");
            })?;
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

struct Credentials {
    user: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn resolve(user: Option<String>, password: Option<String>) -> Self {
        Self {
            user: user.or_else(|| std::env::var(USER_ENV).ok()),
            password: password.or_else(|| std::env::var(PASSWORD_ENV).ok()),
        }
    }

    fn require(&self) -> std::result::Result<(&str, &str), TrackerError> {
        let user = self
            .user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| TrackerError::Validation(format!("no user given: pass --user or set {USER_ENV}")))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| TrackerError::Validation(format!("no password given: pass --password or set {PASSWORD_ENV}")))?;
        Ok((user, password))
    }
}

fn login(tracker: &ReadingTracker<'_>, creds: &Credentials) -> Result<User> {
    let (user, password) = creds.require()?;
    Ok(tracker.authenticate(user, password)?)
}

fn parse_date(input: &str) -> std::result::Result<NaiveDate, TrackerError> {
    Ok(parse_iso_date(input.trim())?)
}

fn lookup_book(config: &AppConfig, isbn: &Isbn13) -> Result<Option<NewBook>> {
    let source = OpenLibrarySource::from_config(&config.lookup, &config.cache_dir())?;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let found = runtime.block_on(source.fetch_by_isbn(isbn))?;
    tracing::debug!(%isbn, source = source.name(), found = found.is_some(), "metadata lookup");
    Ok(found)
}

fn respond(json_output: bool, start: Instant, data: serde_json::Value, text: impl FnOnce()) -> Result<()> {
    if json_output {
        print_json(&json!({
            "status": "ok",
            "data": data,
            "meta": { "duration_ms": start.elapsed().as_millis() }
        }))
    } else {
        text();
        Ok(())
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&db_path)?)
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<TrackerError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<LookupError>().is_some() {
        return ExitCode::NetworkError;
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return ExitCode::FileSystemError;
    }
    ExitCode::GeneralError
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("data_dir", config.data_dir().to_string_lossy().to_string());
    map.insert("database_path", config.database_path().to_string_lossy().to_string());
    map.insert("cache_dir", config.cache_dir().to_string_lossy().to_string());
    map.insert("reading.pages_per_hour", config.reading.pages_per_hour.to_string());
    map.insert(
        "reading.session_minutes",
        config
            .reading
            .session_minutes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(","),
    );
    map.insert("lookup.base_url", config.lookup.base_url.clone());
    map.insert("lookup.min_interval_ms", config.lookup.min_interval_ms.to_string());
    map.insert("lookup.max_retries", config.lookup.max_retries.to_string());
    map.insert("lookup.cache_ttl_hours", config.lookup.cache_ttl_hours.to_string());
    map.insert("lookup.user_agent", config.lookup.user_agent.clone());
    map.insert("logging.level", config.logging.level.clone());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["readtrack", "show", "3", "--json", "--user", "jack"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.user.as_deref(), Some("jack"));
        assert!(matches!(cli.command, Commands::Show { book_id } if book_id == BookId(3)));
    }

    #[test]
    fn target_needs_date_or_clear() {
        assert!(Cli::try_parse_from(["readtrack", "target", "3"]).is_err());
        assert!(Cli::try_parse_from(["readtrack", "target", "3", "2020-09-01", "--clear"]).is_err());
        let cli = Cli::try_parse_from(["readtrack", "target", "3", "--clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Target { clear: true, date: None, .. }));
    }

    #[test]
    fn book_id_must_be_numeric() {
        assert!(Cli::try_parse_from(["readtrack", "complete", "dune"]).is_err());
    }

    #[test]
    fn missing_credentials_are_reported() {
        let creds = Credentials { user: None, password: Some("pw".into()) };
        assert!(matches!(creds.require(), Err(TrackerError::Validation(_))));
        let creds = Credentials { user: Some("jack".into()), password: None };
        assert!(matches!(creds.require(), Err(TrackerError::Validation(_))));
        let creds = Credentials { user: Some("jack".into()), password: Some("pw".into()) };
        assert_eq!(creds.require().unwrap(), ("jack", "pw"));
    }

    #[test]
    fn errors_map_to_exit_codes() {
        let err = anyhow::Error::from(TrackerError::InvalidCredentials);
        assert_eq!(exit_code(&err), ExitCode::AuthError);
        let err = anyhow::Error::from(LookupError::Parse("bad json".into()));
        assert_eq!(exit_code(&err), ExitCode::NetworkError);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), ExitCode::GeneralError);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(" 2020-09-01 ").unwrap(), NaiveDate::from_ymd_opt(2020, 9, 1).unwrap());
        assert!(matches!(parse_date("next week"), Err(TrackerError::InvalidDate(_))));
    }

    #[test]
    fn config_keys_cover_all_sections() {
        let kv = config_key_values(&AppConfig::default());
        assert_eq!(kv["reading.session_minutes"], "15,30,60");
        assert_eq!(kv["logging.level"], "warn");
        assert!(kv.contains_key("lookup.base_url"));
        assert!(kv["database_path"].ends_with("readtrack.db"));
    }
}
