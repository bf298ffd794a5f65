//! Content tree model.
//!
//! # Responsibility
//! - Represent the read-only course catalog as an owned tree.
//! - Define the list projection and the seed document shape.
//!
//! # Invariants
//! - `topics` are sorted by `order_index`; `subtopics` likewise.
//! - Course/topic/subtopic ids are externally chosen and stable.

use serde::{Deserialize, Serialize};

/// Stable, externally chosen course identifier (for example `physics-101`).
pub type CourseId = String;
/// Stable topic identifier.
pub type TopicId = String;
/// Stable subtopic identifier.
pub type SubtopicId = String;

/// Root of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    /// Optional long-form description. `None` never matches a search.
    pub description: Option<String>,
    /// Ordered by `Topic::order_index`.
    pub topics: Vec<Topic>,
}

/// Second tree level, exclusively owned by one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    /// Back-reference by id only.
    pub course_id: CourseId,
    pub title: String,
    /// Unique within the parent course.
    pub order_index: i64,
    /// Ordered by `Subtopic::order_index`.
    pub subtopics: Vec<Subtopic>,
}

/// Leaf of the content tree; the unit of progress tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub id: SubtopicId,
    /// Back-reference by id only.
    pub topic_id: TopicId,
    pub title: String,
    /// Free-text lesson body.
    pub content: Option<String>,
    /// Unique within the parent topic.
    pub order_index: i64,
}

/// Catalog list projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub topic_count: u32,
    pub subtopic_count: u32,
}

impl Course {
    /// Number of subtopics across all topics.
    pub fn subtopic_count(&self) -> usize {
        self.topics.iter().map(|topic| topic.subtopics.len()).sum()
    }
}

/// Seed document accepted by the catalog loader.
///
/// Mirrors the `courses.json` layout: order indexes are implied by array
/// position, so the seed file only lists ids, titles and content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub courses: Vec<SeedCourse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCourse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<SeedTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtopics: Vec<SeedSubtopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSubtopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl SeedCourse {
    /// Converts the seed entry into an owned tree with positional order indexes.
    pub fn into_course(self) -> Course {
        let course_id = self.id;
        let topics = self
            .topics
            .into_iter()
            .enumerate()
            .map(|(topic_index, topic)| {
                let topic_id = topic.id;
                let subtopics = topic
                    .subtopics
                    .into_iter()
                    .enumerate()
                    .map(|(subtopic_index, subtopic)| Subtopic {
                        id: subtopic.id,
                        topic_id: topic_id.clone(),
                        title: subtopic.title,
                        content: subtopic.content,
                        order_index: subtopic_index as i64,
                    })
                    .collect();
                Topic {
                    id: topic_id,
                    course_id: course_id.clone(),
                    title: topic.title,
                    order_index: topic_index as i64,
                    subtopics,
                }
            })
            .collect();

        Course {
            id: course_id,
            title: self.title,
            description: self.description,
            topics,
        }
    }
}
