//! User and enrollment records.
//!
//! # Invariants
//! - `email` is stored normalized (trimmed, lowercase) and is unique.
//! - At most one enrollment exists per `(user_id, course_id)`.

use crate::model::catalog::CourseId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;
/// Stable enrollment identifier.
pub type EnrollmentId = Uuid;

/// Registered platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// bcrypt hash; never serialized into responses.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Epoch ms registration timestamp.
    pub created_at: i64,
}

/// Grants a user the right to track progress inside one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Denormalized for listings.
    pub course_title: String,
    /// Epoch ms enrollment timestamp.
    pub enrolled_at: i64,
}
