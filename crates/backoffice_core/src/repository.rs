//! The record repository boundary
//!
//! Screens never talk to the backend directly. They go through a
//! [`Repository`], one per entity type, which lists, creates, updates and
//! deletes records by primary key.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::record::FormRecord;

pub mod memory;

pub use memory::MemoryRepository;

/// Message shown when the backend gives no usable message of its own
pub const FALLBACK_MESSAGE: &str = "Operation failed";

/// A failed repository call.
///
/// `Display` is the user-facing message: the backend's own text where one was
/// given, [`FALLBACK_MESSAGE`] otherwise.
#[derive(Error, Diagnostic, Debug)]
pub enum RepositoryError {
    /// The backend answered `success: false`
    #[error("{message}")]
    #[diagnostic(code(backoffice_core::repository::rejected))]
    Rejected { message: String },

    /// The backend refused a value that must be unique
    #[error("{message}")]
    #[diagnostic(
        code(backoffice_core::repository::duplicate_key),
        help("Another record already uses this value; reload the list and pick a different one")
    )]
    DuplicateKey { message: String },

    /// The record to update or delete no longer exists
    #[error("Record not found: {id}")]
    #[diagnostic(code(backoffice_core::repository::not_found))]
    NotFound { id: String },

    /// Network failure, non-JSON reply or similar
    #[error("Operation failed")]
    #[diagnostic(
        code(backoffice_core::repository::unavailable),
        help("Check that the backend is reachable and try again")
    )]
    Unavailable {
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    /// Classify a message returned with `success: false`
    pub fn from_server_message(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        if is_duplicate_message(&message) {
            Self::DuplicateKey { message }
        } else {
            Self::Rejected { message }
        }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
        }
    }

    pub fn unavailable(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable {
            cause: Box::new(cause),
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// The message to show the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

fn is_duplicate_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("duplicate") || lower.contains("already exists")
}

/// CRUD access to one entity type's persisted records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// All records, in display order
    async fn list(&self) -> Result<Vec<FormRecord>>;

    /// Persist a new record; returns the stored record if the backend echoes it
    async fn create(&self, record: &FormRecord) -> Result<Option<FormRecord>>;

    async fn update(&self, id: &str, record: &FormRecord) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_passes_through() {
        let err = RepositoryError::from_server_message(Some("Outlet is in use".to_string()));
        assert_eq!(err.user_message(), "Outlet is in use");
        assert!(!err.is_duplicate_key());
    }

    #[test]
    fn test_server_message_is_not_trimmed() {
        let err = RepositoryError::from_server_message(Some("  Outlet is in use\n".to_string()));
        assert_eq!(err.user_message(), "  Outlet is in use\n");
    }

    #[test]
    fn test_missing_message_falls_back() {
        assert_eq!(
            RepositoryError::from_server_message(None).user_message(),
            FALLBACK_MESSAGE
        );
        assert_eq!(
            RepositoryError::from_server_message(Some("  ".to_string())).user_message(),
            FALLBACK_MESSAGE
        );
    }

    #[test]
    fn test_duplicate_entry_detected() {
        let err = RepositoryError::from_server_message(Some(
            "Duplicate entry 'OUT1' for key 'outlet_code'".to_string(),
        ));
        assert!(err.is_duplicate_key());
        assert_eq!(err.user_message(), "Duplicate entry 'OUT1' for key 'outlet_code'");
    }

    #[test]
    fn test_unavailable_uses_fallback() {
        let err = RepositoryError::unavailable(std::io::Error::other("connection refused"));
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    }
}
