//! Enrollment use-case service and membership gate.
//!
//! # Invariants
//! - One enrollment per `(user, course)`; a second attempt is a conflict and
//!   leaves the first enrollment untouched.
//! - `is_enrolled` is a pure predicate with no side effects.

use crate::db::now_epoch_ms;
use crate::error::{ClassifyError, ErrorKind};
use crate::model::account::{Enrollment, UserId};
use crate::model::catalog::CourseId;
use crate::repo::enrollment_repo::EnrollmentRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for enrollment use-cases.
#[derive(Debug)]
pub enum EnrollmentServiceError {
    UserNotFound(UserId),
    CourseNotFound(CourseId),
    /// User is already enrolled in the course.
    AlreadyEnrolled { user_id: UserId, course_id: CourseId },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for EnrollmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(user_id) => write!(f, "user not found: {user_id}"),
            Self::CourseNotFound(course_id) => write!(f, "course not found: {course_id}"),
            Self::AlreadyEnrolled { course_id, .. } => {
                write!(f, "already enrolled in course: {course_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EnrollmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EnrollmentServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ClassifyError for EnrollmentServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::CourseNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyEnrolled { .. } => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

/// Enrollment service facade over repository implementations.
pub struct EnrollmentService<R: EnrollmentRepository> {
    repo: R,
}

impl<R: EnrollmentRepository> EnrollmentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Enrolls `user_id` in `course_id`.
    pub fn enroll(
        &self,
        user_id: UserId,
        course_id: &str,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        if !self.repo.user_exists(user_id)? {
            return Err(EnrollmentServiceError::UserNotFound(user_id));
        }
        if self.repo.course_title(course_id)?.is_none() {
            return Err(EnrollmentServiceError::CourseNotFound(course_id.to_string()));
        }
        if self.is_enrolled(user_id, course_id)? {
            return Err(already_enrolled(user_id, course_id));
        }

        let enrollment = self
            .repo
            .create_enrollment(Uuid::new_v4(), user_id, course_id, now_epoch_ms())
            .map_err(|err| match err {
                RepoError::Conflict(_) => already_enrolled(user_id, course_id),
                other => other.into(),
            })?;
        info!(
            "event=enroll module=service status=ok user_id={} course_id={} enrollment_id={}",
            user_id, course_id, enrollment.id
        );
        Ok(enrollment)
    }

    /// Lists the user's enrollments, newest first. Unknown users have none.
    pub fn list_enrollments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Enrollment>, EnrollmentServiceError> {
        Ok(self.repo.list_enrollments(user_id)?)
    }

    /// Membership gate for progress writes.
    pub fn is_enrolled(
        &self,
        user_id: UserId,
        course_id: &str,
    ) -> Result<bool, EnrollmentServiceError> {
        Ok(self.repo.is_enrolled(user_id, course_id)?)
    }
}

fn already_enrolled(user_id: UserId, course_id: &str) -> EnrollmentServiceError {
    warn!(
        "event=enroll module=service status=rejected reason=already_enrolled user_id={} course_id={}",
        user_id, course_id
    );
    EnrollmentServiceError::AlreadyEnrolled {
        user_id,
        course_id: course_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{EnrollmentService, EnrollmentServiceError};
    use crate::error::{ClassifyError, ErrorKind};
    use crate::model::account::{Enrollment, EnrollmentId, UserId};
    use crate::repo::enrollment_repo::EnrollmentRepository;
    use crate::repo::{RepoError, RepoResult};
    use uuid::Uuid;

    /// Passes every precheck, then loses the UNIQUE race on insert.
    struct RacingRepo;

    impl EnrollmentRepository for RacingRepo {
        fn create_enrollment(
            &self,
            _enrollment_id: EnrollmentId,
            _user_id: UserId,
            _course_id: &str,
            _enrolled_at: i64,
        ) -> RepoResult<Enrollment> {
            Err(RepoError::Conflict("enrollments(user_id, course_id)".to_string()))
        }

        fn is_enrolled(&self, _user_id: UserId, _course_id: &str) -> RepoResult<bool> {
            Ok(false)
        }

        fn get_owned_enrollment(
            &self,
            _enrollment_id: EnrollmentId,
            _user_id: UserId,
        ) -> RepoResult<Option<Enrollment>> {
            Ok(None)
        }

        fn list_enrollments(&self, _user_id: UserId) -> RepoResult<Vec<Enrollment>> {
            Ok(Vec::new())
        }

        fn user_exists(&self, _user_id: UserId) -> RepoResult<bool> {
            Ok(true)
        }

        fn course_title(&self, _course_id: &str) -> RepoResult<Option<String>> {
            Ok(Some("Introduction to Physics".to_string()))
        }
    }

    #[test]
    fn insert_conflict_after_prechecks_is_already_enrolled() {
        let err = EnrollmentService::new(RacingRepo)
            .enroll(Uuid::new_v4(), "physics-101")
            .unwrap_err();
        assert!(matches!(
            err,
            EnrollmentServiceError::AlreadyEnrolled { ref course_id, .. } if course_id == "physics-101"
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
