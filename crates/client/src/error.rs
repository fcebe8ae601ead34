//! Errors surfaced by views.
//!
//! Views never hand raw [`ApiError`]s to their caller. Each failed action
//! ends in exactly one [`ViewError`]: field-level validation messages, a
//! redirect to another route, a single user-facing message, or a
//! cancellation.

use std::collections::BTreeMap;

use core::fmt;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::routing::Route;
use crate::session::SessionError;

/// Message shown when the backend cannot be reached.
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server. Please try again later.";

/// A form field that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Identifier,
    Username,
    Email,
    Password,
    Name,
    Description,
    Price,
    Stock,
    Category,
    Bio,
}

impl Field {
    /// Lowercase field name for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::Name => "name",
            Self::Description => "description",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::Category => "category",
            Self::Bio => "bio",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation messages keyed by field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Record the error of a failed parse, if any, and pass the value through.
    pub fn check<T, E: fmt::Display>(&mut self, field: Field, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.insert(field, e.to_string());
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` carrying these messages otherwise.
    pub fn into_result(self) -> Result<(), ViewError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ViewError::Invalid(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a failed view action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Input was rejected before reaching the backend.
    #[error("{0}")]
    Invalid(FieldErrors),

    /// The session is missing or was rejected; the client moved to this route.
    #[error("Please sign in to continue")]
    Redirected(Route),

    /// The action failed; the message is meant for the user.
    #[error("{0}")]
    Failed(String),

    /// The user declined a confirmation.
    #[error("Cancelled")]
    Cancelled,
}

impl ViewError {
    /// Turn a backend failure into a user-facing message.
    ///
    /// Auth failures are not handled here; see `AppContext::settle`.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Backend { status, message } => {
                if *status >= 500 {
                    capture(err);
                }
                Self::Failed(message.clone().unwrap_or_else(|| fallback.to_owned()))
            }
            ApiError::Transport(_) => Self::Failed(UNREACHABLE_MESSAGE.to_owned()),
            ApiError::Decode(_) | ApiError::Session(_) | ApiError::InvalidBaseUrl(_) => {
                capture(err);
                Self::Failed(fallback.to_owned())
            }
            ApiError::Unauthenticated | ApiError::Unauthorized { .. } => {
                Self::Redirected(Route::Login)
            }
        }
    }
}

/// Report an unexpected failure to Sentry.
fn capture(err: &ApiError) {
    let event_id = sentry::capture_error(err);
    tracing::error!(error = %err, sentry_event_id = %event_id, "Backend call failed");
}

/// Errors building an [`AppContext`](crate::state::AppContext).
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Price, "Price is required");
        errors.insert(Field::Price, "Price must be a number");
        assert_eq!(errors.get(Field::Price), Some("Price is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_display_in_field_order() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Stock, "Stock is required");
        errors.insert(Field::Name, "Name is required");
        assert_eq!(
            errors.to_string(),
            "name: Name is required; stock: Stock is required"
        );
    }

    #[test]
    fn test_check_records_parse_errors() {
        let mut errors = FieldErrors::new();
        let ok: Option<u32> = errors.check(Field::Stock, "4".parse::<u32>());
        let bad: Option<u32> = errors.check(Field::Price, "x".parse::<u32>());
        assert_eq!(ok, Some(4));
        assert!(bad.is_none());
        assert!(errors.get(Field::Price).is_some());
        assert!(matches!(errors.into_result(), Err(ViewError::Invalid(_))));
    }

    #[test]
    fn test_from_api_prefers_backend_message() {
        let err = ApiError::Backend {
            status: 409,
            message: Some("Name taken".to_owned()),
        };
        assert_eq!(
            ViewError::from_api(&err, "Could not save"),
            ViewError::Failed("Name taken".to_owned())
        );

        let err = ApiError::Backend {
            status: 400,
            message: None,
        };
        assert_eq!(
            ViewError::from_api(&err, "Could not save"),
            ViewError::Failed("Could not save".to_owned())
        );
    }

    #[test]
    fn test_from_api_auth_failure_redirects() {
        assert_eq!(
            ViewError::from_api(&ApiError::Unauthenticated, "x"),
            ViewError::Redirected(Route::Login)
        );
    }
}
