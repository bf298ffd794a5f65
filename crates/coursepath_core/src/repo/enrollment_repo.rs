//! Enrollment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `(user, course)` enrollments and answer membership checks.
//! - Provide owner-scoped lookups for progress reads.
//!
//! # Invariants
//! - `UNIQUE(user_id, course_id)` is the source of truth for duplicates; a
//!   racing second insert surfaces as `RepoError::Conflict`.
//! - Listings are ordered by `enrolled_at DESC`, newest first.

use crate::model::account::{Enrollment, EnrollmentId, UserId};
use crate::model::catalog::CourseId;
use crate::repo::{ensure_connection_ready, map_write_error, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENROLLMENT_SELECT_SQL: &str = "SELECT
    e.id AS id,
    e.user_id AS user_id,
    e.course_id AS course_id,
    c.title AS course_title,
    e.enrolled_at AS enrolled_at
FROM enrollments e
JOIN courses c ON c.id = e.course_id";

/// Repository interface for enrollment records.
pub trait EnrollmentRepository {
    /// Inserts one enrollment and returns the stored record.
    fn create_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        user_id: UserId,
        course_id: &str,
        enrolled_at: i64,
    ) -> RepoResult<Enrollment>;
    /// Membership predicate used to gate progress writes.
    fn is_enrolled(&self, user_id: UserId, course_id: &str) -> RepoResult<bool>;
    /// Loads one enrollment only when it belongs to `user_id`.
    fn get_owned_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        user_id: UserId,
    ) -> RepoResult<Option<Enrollment>>;
    /// Lists all enrollments of one user, newest first.
    fn list_enrollments(&self, user_id: UserId) -> RepoResult<Vec<Enrollment>>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
    /// Returns the course title when the course exists.
    fn course_title(&self, course_id: &str) -> RepoResult<Option<String>>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["enrollments", "users", "courses"])?;
        Ok(Self { conn })
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn create_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        user_id: UserId,
        course_id: &str,
        enrolled_at: i64,
    ) -> RepoResult<Enrollment> {
        self.conn
            .execute(
                "INSERT INTO enrollments (id, user_id, course_id, enrolled_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    enrollment_id.to_string(),
                    user_id.to_string(),
                    course_id,
                    enrolled_at,
                ],
            )
            .map_err(|err| map_write_error(err, "enrollments(user_id, course_id)"))?;

        self.get_owned_enrollment(enrollment_id, user_id)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "enrollment `{enrollment_id}` missing after insert"
                ))
            })
    }

    fn is_enrolled(&self, user_id: UserId, course_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM enrollments
                WHERE user_id = ?1 AND course_id = ?2
            );",
            params![user_id.to_string(), course_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_owned_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        user_id: UserId,
    ) -> RepoResult<Option<Enrollment>> {
        let columns = self
            .conn
            .query_row(
                &format!("{ENROLLMENT_SELECT_SQL} WHERE e.id = ?1 AND e.user_id = ?2;"),
                params![enrollment_id.to_string(), user_id.to_string()],
                read_enrollment_columns,
            )
            .optional()?;
        columns.map(EnrollmentColumns::into_enrollment).transpose()
    }

    fn list_enrollments(&self, user_id: UserId) -> RepoResult<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENROLLMENT_SELECT_SQL}
             WHERE e.user_id = ?1
             ORDER BY e.enrolled_at DESC, e.rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(read_enrollment_columns(row)?.into_enrollment()?);
        }
        Ok(items)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn course_title(&self, course_id: &str) -> RepoResult<Option<String>> {
        let title = self
            .conn
            .query_row(
                "SELECT title FROM courses WHERE id = ?1;",
                [course_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(title)
    }
}

struct EnrollmentColumns {
    id: String,
    user_id: String,
    course_id: CourseId,
    course_title: String,
    enrolled_at: i64,
}

impl EnrollmentColumns {
    fn into_enrollment(self) -> RepoResult<Enrollment> {
        Ok(Enrollment {
            id: parse_uuid(&self.id, "enrollments.id")?,
            user_id: parse_uuid(&self.user_id, "enrollments.user_id")?,
            course_id: self.course_id,
            course_title: self.course_title,
            enrolled_at: self.enrolled_at,
        })
    }
}

fn read_enrollment_columns(row: &Row<'_>) -> rusqlite::Result<EnrollmentColumns> {
    Ok(EnrollmentColumns {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        course_id: row.get("course_id")?,
        course_title: row.get("course_title")?,
        enrolled_at: row.get("enrolled_at")?,
    })
}
