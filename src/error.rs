//! Errors surfaced by the server binary before or around request handling.

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Start-up and shutdown failures reported by the `reviewrota` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human readable description of the problem.
        message: String,
    },

    /// The database could not be opened, migrated, or queried.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Binding the listener or serving connections failed.
    #[error("I/O error: {message}")]
    Io {
        /// Underlying I/O error message.
        message: String,
    },
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use crate::persistence::PersistenceError;

    #[test]
    fn persistence_errors_keep_their_message() {
        let error = AppError::from(PersistenceError::BlankDatabaseUrl);

        assert_eq!(
            error.to_string(),
            PersistenceError::BlankDatabaseUrl.to_string()
        );
    }

    #[test]
    fn io_errors_are_prefixed() {
        let error = AppError::from(std::io::Error::other("address in use"));

        assert_eq!(error.to_string(), "I/O error: address in use");
    }
}
