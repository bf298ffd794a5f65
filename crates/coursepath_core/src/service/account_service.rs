//! Account use-case service.
//!
//! # Responsibility
//! - Register users with a normalized, unique email and a bcrypt hash.
//! - Verify credentials for login.
//!
//! # Invariants
//! - Emails are stored trimmed and lowercased.
//! - Unknown email and wrong password are indistinguishable to callers.
//! - Emails and passwords never appear in log events.

use crate::db::now_epoch_ms;
use crate::error::{ClassifyError, ErrorKind};
use crate::model::account::User;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// Email is not a plausible address.
    InvalidEmail,
    /// Password shorter than `MIN_PASSWORD_CHARS`.
    WeakPassword,
    /// Another account already uses this email.
    DuplicateEmail,
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// bcrypt failed to hash or verify.
    Hash(bcrypt::BcryptError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::WeakPassword => write!(
                f,
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            ),
            Self::DuplicateEmail => write!(f, "email is already registered"),
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::Hash(err) => write!(f, "password hashing failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(_) => Self::DuplicateEmail,
            other => Self::Repo(other),
        }
    }
}

impl From<bcrypt::BcryptError> for AccountServiceError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Hash(value)
    }
}

impl ClassifyError for AccountServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail | Self::WeakPassword => ErrorKind::Validation,
            Self::DuplicateEmail => ErrorKind::Conflict,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::Hash(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

/// Trims and lowercases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account service facade over repository implementations.
pub struct AccountService<R: UserRepository> {
    repo: R,
    cost: u32,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates a service hashing with `bcrypt::DEFAULT_COST`.
    pub fn new(repo: R) -> Self {
        Self::with_cost(repo, bcrypt::DEFAULT_COST)
    }

    /// Creates a service with an explicit bcrypt cost.
    pub fn with_cost(repo: R, cost: u32) -> Self {
        Self { repo, cost }
    }

    /// Registers a new user.
    pub fn register(&self, email: &str, password: &str) -> Result<User, AccountServiceError> {
        let email = normalize_email(email);
        if !EMAIL_RE.is_match(&email) {
            return Err(AccountServiceError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AccountServiceError::WeakPassword);
        }
        if self.repo.find_by_email(&email)?.is_some() {
            return Err(AccountServiceError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: bcrypt::hash(password, self.cost)?,
            created_at: now_epoch_ms(),
        };
        // A concurrent registration can still win the UNIQUE(email) race;
        // the conflict maps to DuplicateEmail.
        self.repo.create_user(&user)?;
        info!(
            "event=user_register module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    /// Verifies credentials and returns the matching user.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountServiceError> {
        let email = normalize_email(email);
        let Some(user) = self.repo.find_by_email(&email)? else {
            warn!("event=user_login module=service status=rejected reason=unknown_email");
            return Err(AccountServiceError::InvalidCredentials);
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            warn!(
                "event=user_login module=service status=rejected reason=bad_password user_id={}",
                user.id
            );
            return Err(AccountServiceError::InvalidCredentials);
        }

        info!(
            "event=user_login module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }
}
