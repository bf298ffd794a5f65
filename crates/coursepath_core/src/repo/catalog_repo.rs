//! Course catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the content tree in one atomic write at catalog load.
//! - Read back whole trees (one course, or the full catalog snapshot).
//!
//! # Invariants
//! - Courses are returned in catalog (insertion) order.
//! - Topics and subtopics are returned by `order_index ASC`.
//! - Every multi-statement read runs inside one transaction so callers see a
//!   consistent snapshot of the tree.

use crate::model::catalog::{Course, CourseId, CourseSummary, Subtopic, Topic};
use crate::repo::{ensure_connection_ready, map_write_error, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

/// Repository interface for the read-mostly content tree.
pub trait CatalogRepository {
    /// Inserts full course trees in one transaction; returns inserted course count.
    fn insert_catalog(&self, courses: &[Course]) -> RepoResult<usize>;
    /// Counts stored courses.
    fn count_courses(&self) -> RepoResult<u32>;
    /// Lists course projections with topic/subtopic counts.
    fn list_course_summaries(&self) -> RepoResult<Vec<CourseSummary>>;
    /// Loads one course with its ordered topics and subtopics.
    fn get_course(&self, course_id: &str) -> RepoResult<Option<Course>>;
    /// Loads the whole catalog as one consistent snapshot.
    fn load_catalog(&self) -> RepoResult<Vec<Course>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["courses", "topics", "subtopics"])?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn insert_catalog(&self, courses: &[Course]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for course in courses {
            tx.execute(
                "INSERT INTO courses (id, title, description) VALUES (?1, ?2, ?3);",
                params![course.id, course.title, course.description],
            )
            .map_err(|err| map_write_error(err, &format!("course `{}`", course.id)))?;

            for topic in &course.topics {
                tx.execute(
                    "INSERT INTO topics (id, course_id, title, order_index)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![topic.id, course.id, topic.title, topic.order_index],
                )
                .map_err(|err| map_write_error(err, &format!("topic `{}`", topic.id)))?;

                for subtopic in &topic.subtopics {
                    tx.execute(
                        "INSERT INTO subtopics (id, topic_id, title, content, order_index)
                         VALUES (?1, ?2, ?3, ?4, ?5);",
                        params![
                            subtopic.id,
                            topic.id,
                            subtopic.title,
                            subtopic.content,
                            subtopic.order_index,
                        ],
                    )
                    .map_err(|err| {
                        map_write_error(err, &format!("subtopic `{}`", subtopic.id))
                    })?;
                }
            }
        }
        tx.commit()?;
        Ok(courses.len())
    }

    fn count_courses(&self) -> RepoResult<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM courses;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn list_course_summaries(&self) -> RepoResult<Vec<CourseSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.id AS id,
                c.title AS title,
                c.description AS description,
                (SELECT COUNT(*) FROM topics t WHERE t.course_id = c.id) AS topic_count,
                (SELECT COUNT(*)
                   FROM subtopics s
                   JOIN topics t ON t.id = s.topic_id
                  WHERE t.course_id = c.id) AS subtopic_count
             FROM courses c
             ORDER BY c.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(CourseSummary {
                id: row.get("id")?,
                title: row.get("title")?,
                description: row.get("description")?,
                topic_count: row.get("topic_count")?,
                subtopic_count: row.get("subtopic_count")?,
            });
        }
        Ok(items)
    }

    fn get_course(&self, course_id: &str) -> RepoResult<Option<Course>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let mut courses = load_trees(&tx, Some(course_id))?;
        tx.commit()?;
        Ok(courses.pop())
    }

    fn load_catalog(&self) -> RepoResult<Vec<Course>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let courses = load_trees(&tx, None)?;
        tx.commit()?;
        Ok(courses)
    }
}

/// Assembles course trees from three ordered scans.
///
/// Rows are appended in query order, so per-parent child order follows the
/// `ORDER BY order_index` of each scan.
fn load_trees(conn: &Connection, course_id: Option<&str>) -> RepoResult<Vec<Course>> {
    let mut courses = Vec::new();
    let mut course_slots: HashMap<CourseId, usize> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT id, title, description
             FROM courses
             WHERE (?1 IS NULL OR id = ?1)
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([course_id])?;
        while let Some(row) = rows.next()? {
            let course = Course {
                id: row.get("id")?,
                title: row.get("title")?,
                description: row.get("description")?,
                topics: Vec::new(),
            };
            course_slots.insert(course.id.clone(), courses.len());
            courses.push(course);
        }
    }

    if courses.is_empty() {
        return Ok(courses);
    }

    let mut topic_slots: HashMap<String, (usize, usize)> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT id, course_id, title, order_index
             FROM topics
             WHERE (?1 IS NULL OR course_id = ?1)
             ORDER BY order_index ASC, id ASC;",
        )?;
        let mut rows = stmt.query([course_id])?;
        while let Some(row) = rows.next()? {
            let topic = parse_topic_row(row)?;
            let course_slot = *course_slots.get(&topic.course_id).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "topic `{}` references unknown course `{}`",
                    topic.id, topic.course_id
                ))
            })?;
            let topics = &mut courses[course_slot].topics;
            topic_slots.insert(topic.id.clone(), (course_slot, topics.len()));
            topics.push(topic);
        }
    }

    {
        let mut stmt = conn.prepare(
            "SELECT s.id AS id, s.topic_id AS topic_id, s.title AS title,
                    s.content AS content, s.order_index AS order_index
             FROM subtopics s
             JOIN topics t ON t.id = s.topic_id
             WHERE (?1 IS NULL OR t.course_id = ?1)
             ORDER BY s.order_index ASC, s.id ASC;",
        )?;
        let mut rows = stmt.query([course_id])?;
        while let Some(row) = rows.next()? {
            let subtopic = parse_subtopic_row(row)?;
            let (course_slot, topic_slot) =
                *topic_slots.get(&subtopic.topic_id).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "subtopic `{}` references unknown topic `{}`",
                        subtopic.id, subtopic.topic_id
                    ))
                })?;
            courses[course_slot].topics[topic_slot]
                .subtopics
                .push(subtopic);
        }
    }

    Ok(courses)
}

fn parse_topic_row(row: &Row<'_>) -> RepoResult<Topic> {
    Ok(Topic {
        id: row.get("id")?,
        course_id: row.get("course_id")?,
        title: row.get("title")?,
        order_index: row.get("order_index")?,
        subtopics: Vec::new(),
    })
}

fn parse_subtopic_row(row: &Row<'_>) -> RepoResult<Subtopic> {
    Ok(Subtopic {
        id: row.get("id")?,
        topic_id: row.get("topic_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        order_index: row.get("order_index")?,
    })
}
