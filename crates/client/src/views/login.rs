//! Login screen.

use core::fmt;

use tracing::{info, instrument};

use shopkeep_core::{LoginIdentifier, Password};

use crate::error::{Field, FieldErrors, ViewError};
use crate::routing::Route;
use crate::state::AppContext;

const LOGIN_FAILED: &str = "Login failed";

/// Raw login form input.
#[derive(Clone, Default)]
pub struct LoginForm {
    /// Email address or username.
    pub identifier: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The login screen.
#[derive(Debug)]
pub struct LoginView {
    ctx: AppContext,
    form: LoginForm,
    field_errors: FieldErrors,
    error: Option<String>,
}

impl LoginView {
    /// Open the login screen.
    #[must_use]
    pub fn open(ctx: AppContext) -> Self {
        ctx.navigate(Route::Login);
        Self {
            ctx,
            form: LoginForm::default(),
            field_errors: FieldErrors::new(),
            error: None,
        }
    }

    #[must_use]
    pub const fn form(&self) -> &LoginForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut LoginForm {
        &mut self.form
    }

    /// Messages from the last validation.
    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Message from the last failed submission.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sign in with the form's credentials.
    ///
    /// On success the token is stored and the catalog is entered. On failure
    /// the form keeps its input and any previously stored token is kept.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` for missing fields (no request is sent)
    /// and `ViewError::Failed` when the backend refuses.
    #[instrument(skip(self), fields(identifier = %self.form.identifier))]
    pub async fn submit(&mut self) -> Result<Route, ViewError> {
        self.error = None;

        let mut errors = FieldErrors::new();
        let identifier = errors.check(Field::Identifier, LoginIdentifier::parse(&self.form.identifier));
        let password = errors.check(Field::Password, Password::parse(&self.form.password));
        self.field_errors = errors.clone();
        let (Some(identifier), Some(password)) = (identifier, password) else {
            return Err(ViewError::Invalid(errors));
        };

        match self.ctx.api().login(&identifier, &password).await {
            Ok(token) => {
                self.ctx.sign_in(token)?;
                info!("Login succeeded");
                Ok(self.ctx.navigate(Route::Catalog))
            }
            Err(e) => {
                let err = self.ctx.settle(&e, LOGIN_FAILED);
                if let ViewError::Failed(message) = &err {
                    self.error = Some(message.clone());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemoryTokenStore;

    fn view() -> LoginView {
        let config = ClientConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            PathBuf::from("unused"),
        );
        LoginView::open(AppContext::with_store(config, Arc::new(MemoryTokenStore::new())).unwrap())
    }

    #[tokio::test]
    async fn test_empty_form_is_invalid_per_field() {
        let mut view = view();
        let err = view.submit().await.unwrap_err();
        assert!(matches!(err, ViewError::Invalid(_)));
        assert!(view.field_errors().get(Field::Identifier).is_some());
        assert!(view.field_errors().get(Field::Password).is_some());
    }

    #[tokio::test]
    async fn test_missing_password_keeps_identifier() {
        let mut view = view();
        view.form_mut().identifier = "ada".to_owned();
        assert!(view.submit().await.is_err());
        assert_eq!(view.form().identifier, "ada");
        assert!(view.field_errors().get(Field::Identifier).is_none());
    }

    #[test]
    fn test_form_debug_redacts_password() {
        let form = LoginForm {
            identifier: "ada".to_owned(),
            password: "hunter22".to_owned(),
        };
        assert!(!format!("{form:?}").contains("hunter22"));
    }
}
