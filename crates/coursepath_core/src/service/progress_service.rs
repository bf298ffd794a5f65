//! Progress tracking use-cases.
//!
//! # Responsibility
//! - Record subtopic completions for enrolled users.
//! - Summarize per-enrollment progress with a two-decimal percentage.
//!
//! # Invariants
//! - Check order for `mark_complete`: subtopic existence, then enrollment,
//!   then the idempotent insert.
//! - Repeated completion returns the first record unchanged.
//! - A foreign enrollment id is reported exactly like a missing one.

use crate::db::now_epoch_ms;
use crate::error::{ClassifyError, ErrorKind};
use crate::model::account::{EnrollmentId, UserId};
use crate::model::catalog::{CourseId, SubtopicId};
use crate::model::progress::{CompletionRecord, ProgressSummary};
use crate::repo::enrollment_repo::EnrollmentRepository;
use crate::repo::progress_repo::ProgressRepository;
use crate::repo::RepoError;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for progress use-cases.
#[derive(Debug)]
pub enum ProgressServiceError {
    SubtopicNotFound(SubtopicId),
    /// User is not enrolled in the course that owns the subtopic.
    NotEnrolled { course_id: CourseId },
    /// Missing enrollment, or one owned by another user.
    EnrollmentNotFound(EnrollmentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ProgressServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubtopicNotFound(subtopic_id) => write!(f, "subtopic not found: {subtopic_id}"),
            Self::NotEnrolled { course_id } => {
                write!(f, "not enrolled in course: {course_id}")
            }
            Self::EnrollmentNotFound(enrollment_id) => {
                write!(f, "enrollment not found: {enrollment_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProgressServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProgressServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ClassifyError for ProgressServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::SubtopicNotFound(_) | Self::EnrollmentNotFound(_) => ErrorKind::NotFound,
            Self::NotEnrolled { .. } => ErrorKind::Forbidden,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

/// Progress service over progress and enrollment repositories.
pub struct ProgressService<P: ProgressRepository, E: EnrollmentRepository> {
    progress: P,
    enrollments: E,
}

impl<P: ProgressRepository, E: EnrollmentRepository> ProgressService<P, E> {
    /// Creates a service using the provided repository implementations.
    pub fn new(progress: P, enrollments: E) -> Self {
        Self {
            progress,
            enrollments,
        }
    }

    /// Marks one subtopic complete for `user_id`.
    ///
    /// Idempotent: a second call returns the stored record with its original
    /// `completed_at`.
    pub fn mark_complete(
        &self,
        user_id: UserId,
        subtopic_id: &str,
    ) -> Result<CompletionRecord, ProgressServiceError> {
        let course_id = self
            .progress
            .subtopic_course_id(subtopic_id)?
            .ok_or_else(|| ProgressServiceError::SubtopicNotFound(subtopic_id.to_string()))?;

        if !self.enrollments.is_enrolled(user_id, &course_id)? {
            warn!(
                "event=mark_complete module=service status=rejected reason=not_enrolled user_id={} course_id={}",
                user_id, course_id
            );
            return Err(ProgressServiceError::NotEnrolled { course_id });
        }

        let write =
            self.progress
                .insert_completion_if_absent(user_id, subtopic_id, now_epoch_ms())?;
        info!(
            "event=mark_complete module=service status=ok user_id={} subtopic_id={} created={}",
            user_id, subtopic_id, write.created
        );
        Ok(write.record)
    }

    /// Summarizes progress for one of the user's enrollments.
    pub fn get_progress(
        &self,
        user_id: UserId,
        enrollment_id: EnrollmentId,
    ) -> Result<ProgressSummary, ProgressServiceError> {
        let started_at = Instant::now();
        let enrollment = self
            .enrollments
            .get_owned_enrollment(enrollment_id, user_id)?
            .ok_or(ProgressServiceError::EnrollmentNotFound(enrollment_id))?;

        let progress = self
            .progress
            .course_progress(user_id, &enrollment.course_id)?;
        let completion_percentage =
            completion_percentage(progress.completed_subtopics, progress.total_subtopics);
        debug!(
            "event=get_progress module=service status=ok enrollment_id={} total={} completed={} duration_ms={}",
            enrollment_id,
            progress.total_subtopics,
            progress.completed_subtopics,
            started_at.elapsed().as_millis()
        );

        Ok(ProgressSummary {
            enrollment_id: enrollment.id,
            course_id: enrollment.course_id,
            course_title: enrollment.course_title,
            total_subtopics: progress.total_subtopics,
            completed_subtopics: progress.completed_subtopics,
            completion_percentage,
            completed_items: progress.completed_items,
        })
    }
}

/// Completion percentage with two decimals.
///
/// The ratio is first rounded half-up to four decimals, then scaled to a
/// percentage and rounded half-up to two decimals. Both steps run on integer
/// basis points, so `1/3` yields exactly `33.33`. Returns `0.0` for an empty
/// course.
pub fn completion_percentage(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let completed = u64::from(completed);
    let total = u64::from(total);
    // round_half_up(completed / total * 10_000)
    let basis_points = (2 * completed * 10_000 + total) / (2 * total);
    basis_points as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::completion_percentage;

    #[test]
    fn empty_course_is_zero_percent() {
        assert_eq!(completion_percentage(0, 0), 0.0);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(2, 3), 66.67);
    }

    #[test]
    fn exact_ratios_stay_exact() {
        assert_eq!(completion_percentage(1, 4), 25.0);
        assert_eq!(completion_percentage(4, 4), 100.0);
        assert_eq!(completion_percentage(0, 7), 0.0);
    }

    #[test]
    fn ratio_is_rounded_half_up_at_four_decimals_first() {
        // 1/32 = 0.03125 -> 0.0313 -> 3.13
        assert_eq!(completion_percentage(1, 32), 3.13);
        // 1/6 = 0.16666.. -> 0.1667 -> 16.67
        assert_eq!(completion_percentage(1, 6), 16.67);
    }
}
