//! Alert messages for telling the user about the outcome of an action.
//!
//! Every success and failure that the user should know about is turned into
//! an [Alert], which the presentation layer displays however it likes.

use std::fmt::Display;

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    /// The action went through.
    Success,
    /// The action failed.
    Error,
}

/// A short message with optional details for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Whether this alert reports a success or a failure.
    pub alert_type: AlertType,
    /// The headline, e.g. "Deleted".
    pub message: String,
    /// The longer explanation, may be empty.
    pub details: String,
}

impl Alert {
    /// Create a new success alert
    pub fn success(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert without details
    pub fn error_simple(message: &str) -> Self {
        Self::error(message, "")
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.message, self.details)
        }
    }
}
