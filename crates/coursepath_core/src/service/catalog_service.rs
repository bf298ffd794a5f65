//! Catalog use-case service.
//!
//! # Responsibility
//! - Serve course listings and full course trees.
//! - Load the initial catalog from seed data exactly once.
//!
//! # Invariants
//! - Seeding is skipped when any course already exists.
//! - A seed document is validated as a whole before anything is written;
//!   either every course lands or none does.

use crate::error::{ClassifyError, ErrorKind};
use crate::model::catalog::{Course, CourseId, CourseSummary, SeedCourse, SeedData};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogServiceError {
    /// Requested course does not exist.
    CourseNotFound(CourseId),
    /// Seed document is malformed or internally inconsistent.
    InvalidSeed(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CourseNotFound(course_id) => write!(f, "course not found: {course_id}"),
            Self::InvalidSeed(details) => write!(f, "invalid seed data: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ClassifyError for CatalogServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CourseNotFound(_) => ErrorKind::NotFound,
            Self::InvalidSeed(_) => ErrorKind::Validation,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

/// Outcome of one seeding attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub courses: usize,
    pub topics: usize,
    pub subtopics: usize,
    /// `true` when the catalog was already populated and nothing was written.
    pub skipped: bool,
}

impl SeedReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Parses a JSON seed document (`{"courses": [...]}`).
pub fn parse_seed_json(raw: &str) -> Result<SeedData, CatalogServiceError> {
    serde_json::from_str(raw).map_err(|err| CatalogServiceError::InvalidSeed(err.to_string()))
}

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every course with topic/subtopic counts, in catalog order.
    pub fn list_courses(&self) -> Result<Vec<CourseSummary>, CatalogServiceError> {
        Ok(self.repo.list_course_summaries()?)
    }

    /// Loads one course with its ordered topics and subtopics.
    pub fn get_course(&self, course_id: &str) -> Result<Course, CatalogServiceError> {
        self.repo
            .get_course(course_id)?
            .ok_or_else(|| CatalogServiceError::CourseNotFound(course_id.to_string()))
    }

    /// Loads the catalog from seed data unless courses already exist.
    pub fn seed_catalog(&self, seed: SeedData) -> Result<SeedReport, CatalogServiceError> {
        let started_at = Instant::now();
        if self.repo.count_courses()? > 0 {
            info!("event=catalog_seed module=service status=skipped reason=already_populated");
            return Ok(SeedReport::skipped());
        }

        validate_seed(&seed)?;
        let courses: Vec<Course> = seed
            .courses
            .into_iter()
            .map(SeedCourse::into_course)
            .collect();
        let report = SeedReport {
            courses: courses.len(),
            topics: courses.iter().map(|course| course.topics.len()).sum(),
            subtopics: courses.iter().map(Course::subtopic_count).sum(),
            skipped: false,
        };

        if let Err(err) = self.repo.insert_catalog(&courses) {
            // Ids were validated above, so a collision means another writer
            // seeded the catalog first.
            if matches!(err, RepoError::Conflict(_)) && self.repo.count_courses()? > 0 {
                warn!("event=catalog_seed module=service status=skipped reason=concurrent_seed");
                return Ok(SeedReport::skipped());
            }
            return Err(err.into());
        }

        info!(
            "event=catalog_seed module=service status=ok courses={} topics={} subtopics={} duration_ms={}",
            report.courses,
            report.topics,
            report.subtopics,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

fn validate_seed(seed: &SeedData) -> Result<(), CatalogServiceError> {
    let mut course_ids = HashSet::new();
    let mut topic_ids = HashSet::new();
    let mut subtopic_ids = HashSet::new();

    for course in &seed.courses {
        require_text(&course.id, "course id")?;
        require_text(&course.title, "course title")?;
        if !course_ids.insert(course.id.as_str()) {
            return Err(duplicate("course", &course.id));
        }

        for topic in &course.topics {
            require_text(&topic.id, "topic id")?;
            require_text(&topic.title, "topic title")?;
            if !topic_ids.insert(topic.id.as_str()) {
                return Err(duplicate("topic", &topic.id));
            }

            for subtopic in &topic.subtopics {
                require_text(&subtopic.id, "subtopic id")?;
                require_text(&subtopic.title, "subtopic title")?;
                if !subtopic_ids.insert(subtopic.id.as_str()) {
                    return Err(duplicate("subtopic", &subtopic.id));
                }
            }
        }
    }

    Ok(())
}

fn require_text(value: &str, field: &str) -> Result<(), CatalogServiceError> {
    if value.trim().is_empty() {
        return Err(CatalogServiceError::InvalidSeed(format!(
            "{field} cannot be blank"
        )));
    }
    Ok(())
}

fn duplicate(level: &str, id: &str) -> CatalogServiceError {
    CatalogServiceError::InvalidSeed(format!("duplicate {level} id `{id}`"))
}
