//! Core types for Shopkeep.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod stock;

pub use credential::{CredentialError, LoginIdentifier, Password, Username};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use stock::{Stock, StockError};
