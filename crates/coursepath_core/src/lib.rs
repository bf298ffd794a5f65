//! Core domain logic for the coursepath learning platform.
//! Content tree, search, enrollment gate and progress tracking live here;
//! front ends only wire configuration and print results.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{ClassifyError, ErrorKind, ErrorResponse};
pub use logging::{default_log_level, init_logging, LoggingError};
pub use model::account::{Enrollment, EnrollmentId, User, UserId};
pub use model::catalog::{Course, CourseId, CourseSummary, SeedData, Subtopic, Topic};
pub use model::progress::{CompletedItem, CompletionRecord, ProgressSummary};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
pub use repo::progress_repo::{ProgressRepository, SqliteProgressRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use search::content::{
    search_catalog, search_content, CourseMatchGroup, MatchEntry, MatchKind, SearchError,
    SearchResponse,
};
pub use service::account_service::{AccountService, AccountServiceError};
pub use service::catalog_service::{
    parse_seed_json, CatalogService, CatalogServiceError, SeedReport,
};
pub use service::enrollment_service::{EnrollmentService, EnrollmentServiceError};
pub use service::progress_service::{
    completion_percentage, ProgressService, ProgressServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
