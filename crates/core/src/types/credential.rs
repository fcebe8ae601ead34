//! Credential types.
//!
//! Type-safe wrappers for what a user types into the login and register
//! forms. Passwords are held as [`SecretString`] so they never show up in
//! `Debug` output or logs.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

use super::email::Email;

/// Errors that can occur when validating credentials.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Username is empty.
    #[error("Username is required")]
    EmptyUsername,
    /// Login identifier is empty.
    #[error("Email or username is required")]
    EmptyIdentifier,
    /// Password is empty.
    #[error("Password is required")]
    EmptyPassword,
    /// Password is shorter than the registration minimum.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum number of characters.
        min: usize,
    },
}

/// A non-empty username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyUsername` if nothing is left after trimming.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the login form accepts in its "Email or username" field.
///
/// Input that parses as an [`Email`] is sent to the backend as `email`,
/// anything else as `username`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    /// An email address.
    Email(Email),
    /// A username.
    Username(Username),
}

impl LoginIdentifier {
    /// Classify login input.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyIdentifier` for blank input.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.trim().is_empty() {
            return Err(CredentialError::EmptyIdentifier);
        }
        Ok(Email::parse(s).map_or_else(
            |_| Self::Username(Username(s.trim().to_owned())),
            Self::Email,
        ))
    }
}

/// A password. Never trimmed; whitespace is significant.
#[derive(Clone)]
pub struct Password(SecretString);

impl Password {
    /// Minimum length required when registering.
    pub const MIN_REGISTRATION_LENGTH: usize = 6;

    /// Accept any non-empty password (login).
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyPassword` for empty input.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        Ok(Self(SecretString::from(s.to_owned())))
    }

    /// Accept a password for a new account (at least six characters).
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyPassword` or
    /// `CredentialError::PasswordTooShort`.
    pub fn for_registration(s: &str) -> Result<Self, CredentialError> {
        let password = Self::parse(s)?;
        if s.chars().count() < Self::MIN_REGISTRATION_LENGTH {
            return Err(CredentialError::PasswordTooShort {
                min: Self::MIN_REGISTRATION_LENGTH,
            });
        }
        Ok(password)
    }

    /// Expose the password for the request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trims() {
        assert_eq!(Username::parse(" ada ").unwrap().as_str(), "ada");
        assert_eq!(Username::parse("  "), Err(CredentialError::EmptyUsername));
    }

    #[test]
    fn test_login_identifier_classification() {
        assert!(matches!(
            LoginIdentifier::parse("a@b.com").unwrap(),
            LoginIdentifier::Email(_)
        ));
        assert!(matches!(
            LoginIdentifier::parse("ada").unwrap(),
            LoginIdentifier::Username(_)
        ));
        assert_eq!(
            LoginIdentifier::parse(""),
            Err(CredentialError::EmptyIdentifier)
        );
    }

    #[test]
    fn test_registration_password_length() {
        assert!(Password::for_registration("secret").is_ok());
        assert!(matches!(
            Password::for_registration("short"),
            Err(CredentialError::PasswordTooShort { min: 6 })
        ));
        assert!(matches!(
            Password::for_registration(""),
            Err(CredentialError::EmptyPassword)
        ));
    }

    #[test]
    fn test_login_password_any_length() {
        assert_eq!(Password::parse("x").unwrap().expose(), "x");
    }

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::parse("hunter22").unwrap();
        let debug = format!("{password:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }
}
