//! Shopkeep Core - Shared types library.
//!
//! This crate provides common types used across all Shopkeep components:
//! - `client` - Session, routing, REST client and view-models for the storefront backend
//! - `cli` - Command-line front end that drives the views
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! Every type here is a parse-at-boundary wrapper: form input is converted into
//! one of these types before anything is sent to the backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, stock counts, emails and credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
