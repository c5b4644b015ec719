//! Pooled `SQLite` connections shared by the stores.

use std::fmt;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::{Connection, QueryResult};
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use tokio_util::sync::CancellationToken;

use crate::telemetry::TelemetrySink;

use super::{PersistenceError, StoreError};
use super::migrator::{SchemaVersion, apply_migrations};

/// Database URL that selects a private in-memory database.
pub const IN_MEMORY_DATABASE_URL: &str = ":memory:";

const BUSY_TIMEOUT_MILLIS: u32 = 5_000;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Enables the pragmas every connection relies on.
///
/// Foreign keys are off by default in `SQLite`, and the busy timeout lets
/// concurrent writers queue instead of failing immediately.
pub(crate) fn apply_connection_pragmas(connection: &mut SqliteConnection) -> QueryResult<()> {
    connection.batch_execute(&format!(
        "PRAGMA busy_timeout = {BUSY_TIMEOUT_MILLIS}; \
         PRAGMA journal_mode = WAL; \
         PRAGMA foreign_keys = ON;"
    ))
}

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        apply_connection_pragmas(connection).map_err(r2d2::Error::QueryError)
    }
}

/// Pool of configured `SQLite` connections.
///
/// Each store operation checks out one connection for the duration of its
/// transaction and returns it to the pool afterwards.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl fmt::Debug for DatabasePool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabasePool")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl DatabasePool {
    /// Builds a pool of at most `max_connections` connections to
    /// `database_url`.
    ///
    /// [`IN_MEMORY_DATABASE_URL`] always yields a single long-lived
    /// connection, since every `SQLite` in-memory connection is a separate
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] for a blank URL and
    /// [`PersistenceError::PoolFailed`] when the initial connections cannot be
    /// opened.
    pub fn connect(database_url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let database_url_trimmed = database_url.trim();
        if database_url_trimmed.is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }

        let builder = Pool::builder()
            .connection_timeout(CHECKOUT_TIMEOUT)
            .connection_customizer(Box::new(ConnectionPragmas));

        let sized_builder = if database_url_trimmed == IN_MEMORY_DATABASE_URL {
            builder.max_size(1).idle_timeout(None).max_lifetime(None)
        } else {
            builder.max_size(max_connections.max(1))
        };

        let pool = sized_builder
            .build(ConnectionManager::<SqliteConnection>::new(
                database_url_trimmed,
            ))
            .map_err(|error| PersistenceError::PoolFailed {
                message: error.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Checks out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::PoolFailed`] when no connection becomes
    /// available before the checkout timeout.
    pub(crate) fn connection(&self) -> Result<SqlitePooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|error| PersistenceError::PoolFailed {
                message: error.to_string(),
            })
    }

    /// Runs `operation` inside a deferred transaction on a pooled connection.
    ///
    /// Used for lookups; any error rolls the transaction back.
    pub(crate) fn read_transaction<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
    {
        let mut pooled = self.connection()?;
        let connection: &mut SqliteConnection = &mut pooled;
        connection.transaction(operation)
    }

    /// Runs `operation` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so the reads a decision is based on
    /// and the writes that follow see the same snapshot. Any error rolls the
    /// transaction back. `cancellation` is checked before the connection is
    /// checked out and again just before commit; once it fires the
    /// transaction rolls back with [`StoreError::Cancelled`].
    pub(crate) fn write_transaction<T, F>(
        &self,
        cancellation: &CancellationToken,
        operation: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
    {
        if cancellation.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut pooled = self.connection()?;
        let connection: &mut SqliteConnection = &mut pooled;
        connection.immediate_transaction(|transaction| {
            let written = operation(transaction)?;
            if cancellation.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            Ok(written)
        })
    }

    /// Applies pending migrations through a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when no connection is available or the
    /// migrations fail.
    pub fn run_migrations(
        &self,
        telemetry: &dyn TelemetrySink,
    ) -> Result<SchemaVersion, PersistenceError> {
        let mut connection = self.connection()?;
        apply_migrations(&mut connection, telemetry)
    }

    /// Maximum number of pooled connections.
    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.pool.max_size()
    }
}
