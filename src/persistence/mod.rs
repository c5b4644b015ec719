//! `SQLite` persistence and database migrations.
//!
//! Teams, users, pull requests, and reviewer edges live in a single `SQLite`
//! database. The schema is managed with embedded Diesel migrations, and all
//! store operations run on pooled connections inside one transaction each.

mod error;
mod migrator;
mod pool;
mod pull_request_store;
mod queries;
mod team_store;

#[cfg(test)]
mod test_fixtures;

pub use error::{PersistenceError, StoreError};
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use pool::{DatabasePool, IN_MEMORY_DATABASE_URL};
pub use pull_request_store::PullRequestStore;
pub use team_store::TeamStore;
