//! Application context shared by every view.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::error::{ContextError, ViewError};
use crate::query::QueryClient;
use crate::routing::{Navigator, Route};
use crate::session::{FileTokenStore, Session, TokenStore};

/// Everything a view needs: configuration, the session, the backend and
/// the current route.
///
/// This struct is cheaply cloneable via `Arc`; clones share all state.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: ClientConfig,
    session: Session,
    queries: QueryClient,
    navigator: Navigator,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .field("route", &self.inner.navigator.current())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Create a context whose session persists to `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read or the HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ContextError> {
        let store = Arc::new(FileTokenStore::new(config.session_file.clone()));
        Self::with_store(config, store)
    }

    /// Create a context over an arbitrary token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the HTTP client
    /// cannot be built.
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ContextError> {
        let session = Session::open(store)?;
        let api = ApiClient::new(&config, session.clone())?;
        let queries = QueryClient::new(&config, api);
        let initial = if session.is_authenticated() {
            Route::Catalog
        } else {
            Route::Login
        };

        Ok(Self {
            inner: Arc::new(AppContextInner {
                config,
                session,
                queries,
                navigator: Navigator::new(initial),
            }),
        })
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get the backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.inner.queries.api()
    }

    /// Get the cached query client.
    #[must_use]
    pub fn queries(&self) -> &QueryClient {
        &self.inner.queries
    }

    /// The route currently displayed.
    #[must_use]
    pub fn route(&self) -> Route {
        self.inner.navigator.current()
    }

    /// Navigate through the route guard. Returns the route actually entered.
    pub fn navigate(&self, target: Route) -> Route {
        self.inner.navigator.navigate(target, &self.inner.session)
    }

    /// Enter a protected route or report the redirect.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Redirected` when the guard sent the user elsewhere.
    pub fn enter(&self, target: Route) -> Result<(), ViewError> {
        let landed = self.navigate(target);
        if landed == target {
            Ok(())
        } else {
            Err(ViewError::Redirected(landed))
        }
    }

    /// Store a fresh session token. Cached queries from a previous session
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Failed` if the token cannot be persisted.
    pub fn sign_in(&self, token: secrecy::SecretString) -> Result<(), ViewError> {
        self.inner
            .session
            .login(token)
            .map_err(|e| ViewError::from_api(&ApiError::Session(e), "Could not save session"))?;
        self.inner.queries.clear();
        info!("Signed in");
        Ok(())
    }

    /// Forget the session and return to the login screen.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Failed` if the persisted token cannot be removed.
    /// The in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), ViewError> {
        let result = self.inner.session.logout();
        self.inner.queries.clear();
        self.navigate(Route::Login);
        info!("Signed out");
        result.map_err(|e| ViewError::from_api(&ApiError::Session(e), "Could not remove session"))
    }

    /// Settle a failed backend call into a view outcome.
    ///
    /// Auth failures drop cached data and land on the login screen; anything
    /// else becomes a user-facing message, `fallback` when the backend gave none.
    pub fn settle(&self, err: &ApiError, fallback: &str) -> ViewError {
        if err.is_auth_failure() {
            warn!(error = %err, "Session invalid, returning to login");
            self.inner.queries.clear();
            return ViewError::Redirected(self.navigate(Route::Login));
        }
        ViewError::from_api(err, fallback)
    }
}
