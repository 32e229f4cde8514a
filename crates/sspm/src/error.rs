//! Error types for sspm.
//!
//! This module defines all error types used throughout the sspm crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sspm operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Registry Errors ===
    /// A project with the requested identifier already exists.
    #[error("a project with id {id} already exists")]
    DuplicateIdentifier {
        /// The colliding identifier.
        id: String,
    },

    /// No project with the requested identifier exists.
    #[error("could not find project {id}")]
    NotFound {
        /// The missing identifier.
        id: String,
    },

    /// A record field or command argument is malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what is wrong.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the registry database.
    #[error("failed to open registry at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("registry query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("registry migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// An unknown configuration key was requested.
    #[error("invalid configuration key '{key}'; valid keys are: {}", valid.join(", "))]
    ConfigKey {
        /// The key that was requested.
        key: String,
        /// The keys that would have been accepted.
        valid: Vec<&'static str>,
    },

    /// Failed to write the configuration file.
    #[error("failed to write configuration file {path}: {message}")]
    ConfigWrite {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// The projects location has not been configured yet.
    #[error("sspm is not configured yet; run `sspm init <LOCATION>` first")]
    NotConfigured,

    // === Git Errors ===
    /// The configured git executable does not exist.
    #[error("git executable not found at {path}")]
    GitNotFound {
        /// The configured path.
        path: PathBuf,
    },

    /// A git command exited unsuccessfully.
    #[error("`git {command}` failed: {message}")]
    GitCommand {
        /// The git sub-command that failed.
        command: String,
        /// Captured stderr or exit status.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sspm operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given identifier.
    #[must_use]
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create a duplicate identifier error.
    #[must_use]
    pub fn duplicate(id: impl ToString) -> Self {
        Self::DuplicateIdentifier { id: id.to_string() }
    }

    /// Check if this error means the requested project does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is an identifier collision.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. })
    }

    /// Check if this error is caused by malformed input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotConfigured;
        assert!(err.to_string().contains("sspm init"));

        let err = Error::invalid_input("name must not be empty");
        assert_eq!(err.to_string(), "invalid input: name must not be empty");
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("P_0003");
        assert_eq!(err.to_string(), "could not find project P_0003");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_duplicate_display() {
        let err = Error::duplicate("P_0001");
        assert!(err.to_string().contains("P_0001"));
        assert!(err.is_duplicate());
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_config_key_lists_valid_keys() {
        let err = Error::ConfigKey {
            key: "projects.nope".to_string(),
            valid: vec!["projects.location", "tools.use_git"],
        };
        let msg = err.to_string();
        assert!(msg.contains("projects.nope"));
        assert!(msg.contains("projects.location, tools.use_git"));
    }

    #[test]
    fn test_git_command_display() {
        let err = Error::GitCommand {
            command: "init".to_string(),
            message: "exit status: 128".to_string(),
        };
        assert_eq!(err.to_string(), "`git init` failed: exit status: 128");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/registry.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
