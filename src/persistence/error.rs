//! Error types for local persistence operations.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Infrastructure failures while opening, migrating, or querying the `SQLite`
/// database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// No database URL/path was provided.
    #[error("database URL is required (use --database-url or REVIEWROTA_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Building the connection pool or checking out a connection failed.
    #[error("connection pool error: {message}")]
    PoolFailed {
        /// Error detail from r2d2.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Applying connection pragmas failed.
    #[error("failed to configure connection: {message}")]
    ConnectionSetupFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The review tables are missing; migrations have not been applied.
    #[error("database schema is not initialised (run with --migrate-db)")]
    SchemaNotInitialised,

    /// A read query failed.
    #[error("database query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A write statement failed or touched an unexpected number of rows.
    #[error("database write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel or the row-count check.
        message: String,
    },

    /// A stored row could not be converted into a domain value.
    #[error("stored data is invalid: {message}")]
    CorruptRow {
        /// Description of the offending value.
        message: String,
    },
}

/// Outcomes reported by the team and pull request stores.
///
/// Everything except [`StoreError::Persistence`] leaves the database
/// untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A team with the requested name already exists.
    #[error("team already exists")]
    TeamAlreadyExists,

    /// The referenced team does not exist.
    #[error("team not found")]
    TeamNotFound,

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// A pull request with the requested identifier already exists.
    #[error("pull request already exists")]
    PullRequestAlreadyExists,

    /// The referenced pull request does not exist.
    #[error("pull request not found")]
    PullRequestNotFound,

    /// The pull request is merged and its reviewers are frozen.
    #[error("pull request already merged")]
    PullRequestMerged,

    /// The user is not among the pull request's reviewers.
    #[error("reviewer not assigned")]
    ReviewerNotAssigned,

    /// No active teammate can take over the review.
    #[error("no candidate for reassignment")]
    NoReplacementCandidate,

    /// The caller gave up before the transaction committed; it was rolled
    /// back.
    #[error("operation cancelled before commit")]
    Cancelled,

    /// The database itself failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<DieselError> for StoreError {
    fn from(error: DieselError) -> Self {
        Self::Persistence(classify_diesel_error(&error))
    }
}

/// Returns true when `error` is a uniqueness or primary key conflict.
pub(crate) const fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

fn classify_diesel_error(error: &DieselError) -> PersistenceError {
    let message = error.to_string();
    if message.contains("no such table") {
        PersistenceError::SchemaNotInitialised
    } else {
        PersistenceError::QueryFailed { message }
    }
}
