//! The backend's response envelope

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Every endpoint answers `{success, data?, message?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// `data` on success, [`ClientError::Rejected`] otherwise
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ClientError::Rejected {
                message: self.message,
            })
        }
    }
}
