//! Shopkeep client library.
//!
//! Session handling, the route guard, a REST client for the storefront
//! backend with a query cache, and view-models for the login, register,
//! catalog and profile screens. Front ends (such as the `shopkeep` CLI)
//! render view state and call view actions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod query;
pub mod routing;
pub mod session;
pub mod state;
pub mod views;

pub use config::ClientConfig;
pub use error::{Field, FieldErrors, ViewError};
pub use routing::Route;
pub use state::AppContext;
