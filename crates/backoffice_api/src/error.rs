//! HTTP client errors

use backoffice_core::repository::{FALLBACK_MESSAGE, RepositoryError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    #[diagnostic(
        code(backoffice_api::invalid_base_url),
        help("Use an absolute http(s) URL such as http://localhost:5000/api")
    )]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Request failed")]
    #[diagnostic(
        code(backoffice_api::transport),
        help("Check that the backend is running and reachable")
    )]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body (HTTP {status})")]
    #[diagnostic(code(backoffice_api::decode))]
    Decode {
        status: u16,
        #[source]
        cause: serde_json::Error,
    },

    #[error("HTTP {status}")]
    #[diagnostic(code(backoffice_api::status))]
    Status { status: u16, message: Option<String> },

    /// The backend answered `success: false`
    #[error("{}", message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    #[diagnostic(code(backoffice_api::rejected))]
    Rejected { message: Option<String> },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for RepositoryError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status {
                status: 409,
                message,
            } => RepositoryError::duplicate(message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string())),
            ClientError::Status { message, .. } | ClientError::Rejected { message } => {
                RepositoryError::from_server_message(message)
            }
            other => RepositoryError::unavailable(other),
        }
    }
}
