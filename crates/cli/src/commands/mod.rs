//! Command implementations.

pub mod auth;
pub mod catalog;
pub mod profile;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use thiserror::Error;

use shopkeep_client::config::ConfigError;
use shopkeep_client::error::ContextError;
use shopkeep_client::views::Confirm;
use shopkeep_client::{Route, ViewError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Invalid(shopkeep_client::FieldErrors),

    /// The route guard or an auth failure sent the user elsewhere.
    #[error("not signed in (run `shopkeep login`), now at {0}")]
    SignedOut(Route),

    /// The action failed with a user-facing message.
    #[error("{0}")]
    Failed(String),

    /// The user declined a confirmation.
    #[error("cancelled")]
    Cancelled,

    /// The requested item is not listed.
    #[error("{0} not found")]
    NotFound(String),

    /// An edit left fields empty that the item has no value for.
    #[error("{item} has no current value for {flags}; pass them explicitly")]
    MissingFlags { item: String, flags: String },

    #[error("failed to render output: {0}")]
    Render(#[from] askama::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Cancelled => ExitCode::SUCCESS,
            Self::Invalid(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

impl From<ViewError> for CliError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Invalid(errors) => Self::Invalid(errors),
            ViewError::Redirected(route) => Self::SignedOut(route),
            ViewError::Failed(message) => Self::Failed(message),
            ViewError::Cancelled => Self::Cancelled,
        }
    }
}

/// Confirmation prompt on stdin, or unconditional agreement with `--yes`.
pub struct StdinConfirm {
    assume_yes: bool,
}

impl StdinConfirm {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut out = io::stdout().lock();
        if write!(out, "{message} [y/N] ").and_then(|()| out.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Write rendered output to stdout.
pub fn emit(text: &str) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", text.trim_end())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(StdinConfirm::new(true).confirm("Delete?"));
    }

    #[test]
    fn test_view_errors_map_to_cli_errors() {
        assert!(matches!(
            CliError::from(ViewError::Redirected(Route::Login)),
            CliError::SignedOut(Route::Login)
        ));
        assert!(matches!(
            CliError::from(ViewError::Cancelled),
            CliError::Cancelled
        ));
    }
}
