//! Command-line front end for the coursepath core.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment, start logging and
//!   open the database.
//! - Run one use-case per invocation and print its JSON result.
//!
//! # Invariants
//! - Success prints the payload to stdout and exits 0.
//! - Failure prints an `ErrorResponse` to stderr and exits non-zero.

use clap::{Parser, Subcommand};
use coursepath_core::config::{ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_SEED_PATH};
use coursepath_core::{
    init_logging, open_db, parse_seed_json, search_content, AccountService, CatalogService,
    ClassifyError, CoreConfig, EnrollmentService, ErrorKind, ErrorResponse, ProgressService,
    SeedReport, SqliteCatalogRepository, SqliteEnrollmentRepository, SqliteProgressRepository,
    SqliteUserRepository,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

/// coursepath - course catalog, search and progress tracking
#[derive(Parser, Debug)]
#[command(name = "coursepath", version)]
#[command(about = "Browse courses, search content and track learning progress")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "COURSEPATH_DB_PATH")]
    db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "COURSEPATH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, env = "COURSEPATH_LOG_DIR")]
    log_dir: Option<String>,

    /// Seed document applied before every command when the catalog is empty
    #[arg(long, global = true, env = "COURSEPATH_SEED_PATH")]
    seed: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the catalog from a JSON seed file (no-op if courses exist)
    Seed {
        /// Seed file; defaults to --seed
        file: Option<PathBuf>,
    },
    /// List courses with topic and subtopic counts
    Courses,
    /// Show one course with its full topic tree
    Course { course_id: String },
    /// Case-insensitive search over titles, descriptions and content
    Search { query: String },
    /// Create an account
    Register { email: String, password: String },
    /// Verify credentials
    Login { email: String, password: String },
    /// Enroll a user in a course
    Enroll { user_id: Uuid, course_id: String },
    /// List a user's enrollments, newest first
    Enrollments { user_id: Uuid },
    /// Mark a subtopic complete
    Complete { user_id: Uuid, subtopic_id: String },
    /// Show progress for one enrollment
    Progress { user_id: Uuid, enrollment_id: Uuid },
}

impl Cli {
    fn config(&self) -> CoreConfig {
        CoreConfig::from_lookup(|key| match key {
            ENV_DB_PATH => self.db.clone(),
            ENV_LOG_LEVEL => self.log_level.clone(),
            ENV_LOG_DIR => self.log_dir.clone(),
            ENV_SEED_PATH => self.seed.clone(),
            _ => None,
        })
    }
}

/// Front-end failures outside the core services.
#[derive(Debug)]
enum CliError {
    MissingSeedFile,
    ReadSeed {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSeedFile => write!(f, "no seed file given; pass FILE or --seed"),
            Self::ReadSeed { path, source } => {
                write!(f, "cannot read seed file `{}`: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode response: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadSeed { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::MissingSeedFile => None,
        }
    }
}

impl ClassifyError for CliError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSeedFile | Self::ReadSeed { .. } => ErrorKind::Validation,
            Self::Encode(_) => ErrorKind::Internal,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();

    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(response) => {
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}: {}", response.error, response.message),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &CoreConfig) -> Result<(), ErrorResponse> {
    let conn = open_db(&config.db_path).map_err(reject)?;
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );

    if let Some(path) = &config.seed_path {
        if !matches!(command, Command::Seed { .. }) {
            seed_from_file(&conn, path)?;
        }
    }

    match command {
        Command::Seed { file } => {
            let path = file
                .or_else(|| config.seed_path.clone())
                .ok_or_else(|| reject(CliError::MissingSeedFile))?;
            emit(&seed_from_file(&conn, &path)?)
        }
        Command::Courses => {
            emit(&catalog_service(&conn)?.list_courses().map_err(reject)?)
        }
        Command::Course { course_id } => {
            emit(&catalog_service(&conn)?.get_course(&course_id).map_err(reject)?)
        }
        Command::Search { query } => {
            let repo = SqliteCatalogRepository::try_new(&conn).map_err(reject)?;
            emit(&search_content(&repo, &query).map_err(reject)?)
        }
        Command::Register { email, password } => {
            emit(&account_service(&conn)?.register(&email, &password).map_err(reject)?)
        }
        Command::Login { email, password } => {
            emit(&account_service(&conn)?.authenticate(&email, &password).map_err(reject)?)
        }
        Command::Enroll { user_id, course_id } => {
            let service = enrollment_service(&conn)?;
            emit(&service.enroll(user_id, &course_id).map_err(reject)?)
        }
        Command::Enrollments { user_id } => {
            let service = enrollment_service(&conn)?;
            emit(&service.list_enrollments(user_id).map_err(reject)?)
        }
        Command::Complete {
            user_id,
            subtopic_id,
        } => {
            let service = progress_service(&conn)?;
            emit(&service.mark_complete(user_id, &subtopic_id).map_err(reject)?)
        }
        Command::Progress {
            user_id,
            enrollment_id,
        } => {
            let service = progress_service(&conn)?;
            emit(&service.get_progress(user_id, enrollment_id).map_err(reject)?)
        }
    }
}

fn seed_from_file(conn: &Connection, path: &Path) -> Result<SeedReport, ErrorResponse> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        reject(CliError::ReadSeed {
            path: path.to_path_buf(),
            source,
        })
    })?;
    let seed = parse_seed_json(&raw).map_err(reject)?;
    catalog_service(conn)?.seed_catalog(seed).map_err(reject)
}

fn catalog_service(
    conn: &Connection,
) -> Result<CatalogService<SqliteCatalogRepository<'_>>, ErrorResponse> {
    let repo = SqliteCatalogRepository::try_new(conn).map_err(reject)?;
    Ok(CatalogService::new(repo))
}

fn account_service(
    conn: &Connection,
) -> Result<AccountService<SqliteUserRepository<'_>>, ErrorResponse> {
    let repo = SqliteUserRepository::try_new(conn).map_err(reject)?;
    Ok(AccountService::new(repo))
}

fn enrollment_service(
    conn: &Connection,
) -> Result<EnrollmentService<SqliteEnrollmentRepository<'_>>, ErrorResponse> {
    let repo = SqliteEnrollmentRepository::try_new(conn).map_err(reject)?;
    Ok(EnrollmentService::new(repo))
}

fn progress_service(
    conn: &Connection,
) -> Result<
    ProgressService<SqliteProgressRepository<'_>, SqliteEnrollmentRepository<'_>>,
    ErrorResponse,
> {
    let progress = SqliteProgressRepository::try_new(conn).map_err(reject)?;
    let enrollments = SqliteEnrollmentRepository::try_new(conn).map_err(reject)?;
    Ok(ProgressService::new(progress, enrollments))
}

fn emit<T: Serialize>(value: &T) -> Result<(), ErrorResponse> {
    let json = serde_json::to_string_pretty(value).map_err(|err| reject(CliError::Encode(err)))?;
    println!("{json}");
    Ok(())
}

fn reject<E: ClassifyError>(err: E) -> ErrorResponse {
    ErrorResponse::from_error(&err)
}
