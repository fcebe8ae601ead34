//! Routes and the route guard.
//!
//! The client has four screens. [`Route::Catalog`] and [`Route::Profile`] are
//! protected: entering them without a session token lands on
//! [`Route::Login`] instead.

use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::session::Session;

/// A screen of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Catalog,
    Profile,
}

impl Route {
    /// The path of this route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Catalog => "/catalog",
            Self::Profile => "/profile",
        }
    }

    /// Resolve a path to a route. `/` and unknown paths resolve to the
    /// catalog; a trailing slash or query string is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        match path {
            "/login" | "login" => Self::Login,
            "/register" | "register" => Self::Register,
            "/profile" | "profile" => Self::Profile,
            _ => Self::Catalog,
        }
    }

    /// Whether the route requires a session token.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Catalog | Self::Profile)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Whether the client currently holds a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

impl AuthState {
    /// Derive the state from a session.
    #[must_use]
    pub fn of(session: &Session) -> Self {
        if session.is_authenticated() {
            Self::Authenticated
        } else {
            Self::Anonymous
        }
    }
}

/// Gate for protected routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    /// Where a request to enter `target` actually lands.
    #[must_use]
    pub const fn resolve(target: Route, state: AuthState) -> Route {
        match (target.is_protected(), state) {
            (true, AuthState::Anonymous) => Route::Login,
            _ => target,
        }
    }
}

/// Tracks the current route. Every navigation passes through [`RouteGuard`].
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Arc<RwLock<Route>>,
}

impl Navigator {
    /// Start at `initial` (not guarded; call [`Navigator::navigate`] to enter a route).
    #[must_use]
    pub fn new(initial: Route) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Navigate to `target`, redirecting to login if the route is protected
    /// and there is no session. Returns the route actually entered.
    pub fn navigate(&self, target: Route, session: &Session) -> Route {
        let landed = RouteGuard::resolve(target, AuthState::of(session));
        if landed != target {
            debug!(from = %target, to = %landed, "Redirected by route guard");
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = landed;
        landed
    }

    /// The route currently displayed.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}
