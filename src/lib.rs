//! T-Cash is a client for a personal "cash in / cash out" ledger with notes.
//!
//! This library talks to the remote ledger REST API and provides the view
//! models that a front end renders: the home screen (balance and recent
//! transactions), the transaction and note lists, and the profile screen.
//! The view models own a local copy of the remote data, derive
//! filtered/sorted views from it and resynchronize after every mutation.

#![warn(missing_docs)]

mod alert;
pub mod api;
mod config;
pub mod endpoints;
pub mod format;
mod identity;
mod logging;
pub mod models;
pub mod stub;
mod token_cache;
pub mod view_model;

#[cfg(test)]
mod test_utils;

pub use alert::{Alert, AlertType};
pub use config::ClientConfig;
pub use identity::{AuthState, Identity, IdentityProvider, SessionIdentityProvider, UserId};
pub use logging::{LOG_BODY_LENGTH_LIMIT, setup_logging};
pub use token_cache::{FileTokenCache, MemoryTokenCache, TokenCache};

/// The broad categories of failure that the presentation layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The identity has not been resolved yet. Not shown to the user.
    AuthNotReady,
    /// The request could not complete.
    NetworkFailure,
    /// The remote API answered, but not with a usable success response.
    RemoteRejected,
    /// The user's input was rejected before any request was made.
    ValidationFailure,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum Error {
    /// The identity provider has not resolved a signed in user yet.
    #[error("the user is not signed in yet")]
    AuthNotReady,

    /// The request could not be sent or no response was received, e.g. the
    /// server is unreachable or the request timed out.
    #[error("could not reach the ledger API: {0}")]
    NetworkFailure(String),

    /// The ledger API responded with a non-success status code.
    ///
    /// `message` holds the server's explanation when the response body had
    /// one.
    #[error("the ledger API rejected the request with status {status}")]
    RemoteRejected {
        /// The HTTP status code of the response.
        status: u16,
        /// The `message` field of the response body, if any.
        message: Option<String>,
    },

    /// The ledger API responded with a body that could not be understood.
    #[error("could not read the ledger API response: {0}")]
    UnexpectedResponse(String),

    /// A required text field was empty or only whitespace.
    ///
    /// Callers should pass in a human readable name of the field.
    #[error("the field \"{0}\" must not be empty")]
    EmptyField(&'static str),

    /// An amount could not be parsed as a finite, positive number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A delete was confirmed without a matching pending delete request.
    #[error("tried to confirm a delete that was not requested")]
    DeleteNotConfirmed,

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// The category this error falls in.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AuthNotReady => ErrorKind::AuthNotReady,
            Error::NetworkFailure(_) => ErrorKind::NetworkFailure,
            Error::RemoteRejected { .. } | Error::UnexpectedResponse(_) => {
                ErrorKind::RemoteRejected
            }
            Error::EmptyField(_)
            | Error::InvalidAmount(_)
            | Error::DeleteNotConfirmed
            | Error::InvalidConfig(_) => ErrorKind::ValidationFailure,
        }
    }

    /// The alert to show the user for this error.
    ///
    /// Returns `None` for [Error::AuthNotReady], which defers silently until
    /// the identity is known.
    pub fn to_alert(&self) -> Option<Alert> {
        let alert = match self {
            Error::AuthNotReady => return None,
            Error::NetworkFailure(_) => Alert::error(
                "Connection problem",
                "Could not reach the server. Check your connection and try again.",
            ),
            Error::RemoteRejected {
                message: Some(message),
                ..
            } => Alert::error("Error", message),
            Error::RemoteRejected { status: 404, .. } => Alert::error(
                "Not found",
                "The item could not be found. \
                Try refreshing to see if it has already been deleted.",
            ),
            Error::RemoteRejected { .. } | Error::UnexpectedResponse(_) => {
                Alert::error("Error", "Something went wrong. Please try again.")
            }
            Error::EmptyField(_) => Alert::error("Error", "Please fill all fields"),
            Error::InvalidAmount(_) => {
                Alert::error("Invalid Input", "Please enter a valid number.")
            }
            Error::DeleteNotConfirmed => Alert::error(
                "Delete not confirmed",
                "Confirm the delete before it can go ahead.",
            ),
            Error::InvalidConfig(reason) => Alert::error("Invalid settings", reason),
        };

        Some(alert)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            Error::RemoteRejected {
                status: status.as_u16(),
                message: None,
            }
        } else if error.is_decode() {
            Error::UnexpectedResponse(error.to_string())
        } else {
            Error::NetworkFailure(error.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::UnexpectedResponse(error.to_string())
    }
}
