//! Learning progress read models.
//!
//! # Invariants
//! - A completion record is created once per `(user, subtopic)` and never
//!   rewritten, so `completed_at` is stable across repeated completions.
//! - `completion_percentage` is derived from the two counts, never stored.

use crate::model::account::EnrollmentId;
use crate::model::catalog::{CourseId, SubtopicId};
use serde::{Deserialize, Serialize};

/// Result of marking one subtopic complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub subtopic_id: SubtopicId,
    pub completed: bool,
    /// Epoch ms of the first completion.
    pub completed_at: i64,
}

/// One completed subtopic inside a progress summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub subtopic_id: SubtopicId,
    pub subtopic_title: String,
    pub completed_at: i64,
}

/// Aggregate progress of one user within one enrolled course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub course_title: String,
    pub total_subtopics: u32,
    pub completed_subtopics: u32,
    /// Percentage with two decimals, e.g. `33.33`.
    pub completion_percentage: f64,
    /// Ordered by `completed_at` ascending.
    pub completed_items: Vec<CompletedItem>,
}
