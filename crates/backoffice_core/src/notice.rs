//! User-facing notices for controller outcomes

use std::fmt;
use std::time::Duration;

use crate::controller::{ActionOutcome, DeleteOutcome, FormError, SubmitOutcome};
use crate::repository::FALLBACK_MESSAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A popup message. Info notices go away on their own, errors stay until
/// dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub dismiss_after: Option<Duration>,
}

impl Notice {
    pub fn info(message: impl Into<String>, dismiss_after: Duration) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            dismiss_after: Some(dismiss_after),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            level: NoticeLevel::Error,
            message,
            dismiss_after: None,
        }
    }

    pub fn for_action(outcome: ActionOutcome, dismiss_after: Duration) -> Option<Self> {
        match outcome {
            ActionOutcome::NoRecordsAvailable => {
                Some(Self::info("No records available", dismiss_after))
            }
            _ => None,
        }
    }

    pub fn for_submit(outcome: &SubmitOutcome, dismiss_after: Duration) -> Option<Self> {
        match outcome {
            SubmitOutcome::Created(_) => Some(Self::info("Record added", dismiss_after)),
            SubmitOutcome::Updated => Some(Self::info("Record updated", dismiss_after)),
            SubmitOutcome::NoChange => Some(Self::info("No changes to save", dismiss_after)),
            SubmitOutcome::Discarded => None,
        }
    }

    pub fn for_delete(outcome: DeleteOutcome, dismiss_after: Duration) -> Option<Self> {
        match outcome {
            DeleteOutcome::Deleted => Some(Self::info("Record deleted", dismiss_after)),
            DeleteOutcome::Discarded => None,
        }
    }

    /// Field errors are shown inline, so validation failures get no popup
    pub fn for_error(error: &FormError) -> Option<Self> {
        match error {
            FormError::ValidationFailed { .. } => None,
            FormError::Repository(err) => Some(Self::error(err.user_message())),
            other => Some(Self::error(other.to_string())),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
