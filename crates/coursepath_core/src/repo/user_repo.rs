//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Emails are looked up exactly as given; callers normalize before calling.
//! - A duplicate email insert yields `RepoError::Conflict`.

use crate::model::account::User;
use crate::repo::{ensure_connection_ready, map_write_error, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, password_hash, created_at FROM users";

/// Repository interface for registered users.
pub trait UserRepository {
    /// Inserts one user row.
    fn create_user(&self, user: &User) -> RepoResult<()>;
    /// Loads one user by normalized email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO users (id, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    user.id.to_string(),
                    user.email,
                    user.password_hash,
                    user.created_at,
                ],
            )
            .map_err(|err| map_write_error(err, "users.email"))?;
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                [email],
                read_user_columns,
            )
            .optional()?;
        user.map(UserColumns::into_user).transpose()
    }
}

struct UserColumns {
    id: String,
    email: String,
    password_hash: String,
    created_at: i64,
}

impl UserColumns {
    fn into_user(self) -> RepoResult<User> {
        Ok(User {
            id: parse_uuid(&self.id, "users.id")?,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<UserColumns> {
    Ok(UserColumns {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}
