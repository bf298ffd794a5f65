//! Subtopic progress repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record completion facts with insert-if-absent semantics.
//! - Aggregate per-course completion counts in one read scope.
//!
//! # Invariants
//! - At most one row per `(user_id, subtopic_id)`, enforced by a UNIQUE key.
//! - Existing rows are never updated; a repeated insert returns the stored row.
//! - Completed items are ordered by `completed_at ASC`, ties by insert order.

use crate::db::is_constraint_violation;
use crate::model::account::UserId;
use crate::model::catalog::CourseId;
use crate::model::progress::{CompletedItem, CompletionRecord};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Outcome of an insert-if-absent completion write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionWrite {
    /// The stored record (new or pre-existing).
    pub record: CompletionRecord,
    /// `true` when this call created the row.
    pub created: bool,
}

/// Raw per-course progress aggregates read in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    pub total_subtopics: u32,
    pub completed_subtopics: u32,
    pub completed_items: Vec<CompletedItem>,
}

/// Repository interface for completion tracking.
pub trait ProgressRepository {
    /// Resolves the course owning a subtopic, or `None` for unknown ids.
    fn subtopic_course_id(&self, subtopic_id: &str) -> RepoResult<Option<CourseId>>;
    /// Atomically inserts a completion unless one already exists.
    fn insert_completion_if_absent(
        &self,
        user_id: UserId,
        subtopic_id: &str,
        completed_at: i64,
    ) -> RepoResult<CompletionWrite>;
    /// Loads the stored completion for `(user, subtopic)`.
    fn get_completion(
        &self,
        user_id: UserId,
        subtopic_id: &str,
    ) -> RepoResult<Option<CompletionRecord>>;
    /// Counts total/completed subtopics and lists completed items for one course.
    fn course_progress(&self, user_id: UserId, course_id: &str) -> RepoResult<CourseProgress>;
}

/// SQLite-backed progress repository.
pub struct SqliteProgressRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProgressRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["subtopic_progress", "subtopics", "topics"])?;
        Ok(Self { conn })
    }
}

impl ProgressRepository for SqliteProgressRepository<'_> {
    fn subtopic_course_id(&self, subtopic_id: &str) -> RepoResult<Option<CourseId>> {
        let course_id = self
            .conn
            .query_row(
                "SELECT t.course_id
                 FROM subtopics s
                 JOIN topics t ON t.id = s.topic_id
                 WHERE s.id = ?1;",
                [subtopic_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(course_id)
    }

    fn insert_completion_if_absent(
        &self,
        user_id: UserId,
        subtopic_id: &str,
        completed_at: i64,
    ) -> RepoResult<CompletionWrite> {
        let inserted = self.conn.execute(
            "INSERT INTO subtopic_progress (user_id, subtopic_id, completed, completed_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(user_id, subtopic_id) DO NOTHING;",
            params![user_id.to_string(), subtopic_id, completed_at],
        );

        let created = match inserted {
            Ok(changed) => changed == 1,
            // A uniqueness race that slips past ON CONFLICT still means "already
            // completed"; other constraint failures are caught by the read-back.
            Err(err) if is_constraint_violation(&err) => false,
            Err(err) => return Err(err.into()),
        };

        let record = self
            .get_completion(user_id, subtopic_id)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "no progress row for user `{user_id}` and subtopic `{subtopic_id}` after insert"
                ))
            })?;
        Ok(CompletionWrite { record, created })
    }

    fn get_completion(
        &self,
        user_id: UserId,
        subtopic_id: &str,
    ) -> RepoResult<Option<CompletionRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT subtopic_id, completed, completed_at
                 FROM subtopic_progress
                 WHERE user_id = ?1 AND subtopic_id = ?2;",
                params![user_id.to_string(), subtopic_id],
                |row| {
                    Ok(CompletionRecord {
                        subtopic_id: row.get(0)?,
                        completed: row.get(1)?,
                        completed_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn course_progress(&self, user_id: UserId, course_id: &str) -> RepoResult<CourseProgress> {
        let user_id = user_id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        let total_subtopics: u32 = tx.query_row(
            "SELECT COUNT(*)
             FROM subtopics s
             JOIN topics t ON t.id = s.topic_id
             WHERE t.course_id = ?1;",
            [course_id],
            |row| row.get(0),
        )?;

        let completed_subtopics: u32 = tx.query_row(
            "SELECT COUNT(*)
             FROM subtopic_progress p
             JOIN subtopics s ON s.id = p.subtopic_id
             JOIN topics t ON t.id = s.topic_id
             WHERE p.user_id = ?1
               AND t.course_id = ?2
               AND p.completed = 1;",
            params![user_id, course_id],
            |row| row.get(0),
        )?;

        let mut completed_items = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT p.subtopic_id, s.title, p.completed_at
                 FROM subtopic_progress p
                 JOIN subtopics s ON s.id = p.subtopic_id
                 JOIN topics t ON t.id = s.topic_id
                 WHERE p.user_id = ?1
                   AND t.course_id = ?2
                   AND p.completed = 1
                 ORDER BY p.completed_at ASC, p.id ASC;",
            )?;
            let mut rows = stmt.query(params![user_id, course_id])?;
            while let Some(row) = rows.next()? {
                completed_items.push(CompletedItem {
                    subtopic_id: row.get(0)?,
                    subtopic_title: row.get(1)?,
                    completed_at: row.get(2)?,
                });
            }
        }

        tx.commit()?;
        Ok(CourseProgress {
            total_subtopics,
            completed_subtopics,
            completed_items,
        })
    }
}
