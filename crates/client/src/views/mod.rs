//! View-models for the client's screens.
//!
//! Each view owns its form and display state and talks to the backend
//! through an [`AppContext`](crate::state::AppContext). A front end renders
//! the state and calls the actions; actions return the route the user should
//! now see or a [`ViewError`](crate::error::ViewError).

mod catalog;
mod login;
mod profile;
mod register;

pub use catalog::{
    CATEGORY_DELETE_WARNING, CatalogView, PRODUCT_DELETE_WARNING, ProductForm, ProductsRequest,
};
pub use login::{LoginForm, LoginView};
pub use profile::{EMPTY_BIO, ProfileDraft, ProfileField, ProfileView};
pub use register::{RegisterForm, RegisterView};

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Show `message` and return whether the user agreed.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Fallback message for catalog and profile requests.
pub(crate) const REQUEST_FAILED: &str = "Request failed";
