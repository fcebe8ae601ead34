//! Registration screen.

use core::fmt;

use tracing::{info, instrument};

use shopkeep_core::{Email, Password, Username};

use crate::error::{Field, FieldErrors, ViewError};
use crate::routing::Route;
use crate::state::AppContext;

const REGISTRATION_FAILED: &str = "Registration failed";

/// Raw registration form input.
#[derive(Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The registration screen.
#[derive(Debug)]
pub struct RegisterView {
    ctx: AppContext,
    form: RegisterForm,
    field_errors: FieldErrors,
    error: Option<String>,
}

impl RegisterView {
    /// Open the registration screen.
    #[must_use]
    pub fn open(ctx: AppContext) -> Self {
        ctx.navigate(Route::Register);
        Self {
            ctx,
            form: RegisterForm::default(),
            field_errors: FieldErrors::new(),
            error: None,
        }
    }

    #[must_use]
    pub const fn form(&self) -> &RegisterForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut RegisterForm {
        &mut self.form
    }

    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Create an account, store its token and enter the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` when a field is missing, the email is
    /// malformed or the password is shorter than six characters (no request
    /// is sent), and `ViewError::Failed` when the backend refuses.
    #[instrument(skip(self), fields(username = %self.form.username))]
    pub async fn submit(&mut self) -> Result<Route, ViewError> {
        self.error = None;

        let mut errors = FieldErrors::new();
        let username = errors.check(Field::Username, Username::parse(&self.form.username));
        let email = errors.check(Field::Email, Email::parse(&self.form.email));
        let password = errors.check(
            Field::Password,
            Password::for_registration(&self.form.password),
        );
        self.field_errors = errors.clone();
        let (Some(username), Some(email), Some(password)) = (username, email, password) else {
            return Err(ViewError::Invalid(errors));
        };

        match self.ctx.api().register(&username, &email, &password).await {
            Ok(token) => {
                self.ctx.sign_in(token)?;
                info!("Registration succeeded");
                Ok(self.ctx.navigate(Route::Catalog))
            }
            Err(e) => {
                let err = self.ctx.settle(&e, REGISTRATION_FAILED);
                if let ViewError::Failed(message) = &err {
                    self.error = Some(message.clone());
                }
                Err(err)
            }
        }
    }
}
