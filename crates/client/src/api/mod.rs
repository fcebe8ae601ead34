//! REST client for the storefront backend.
//!
//! # Authorization
//!
//! Every request goes through [`ApiClient::send`], which owns the whole
//! session policy so that no caller has to repeat it:
//!
//! - [`Access::Required`] calls with no session token fail with
//!   [`ApiError::Unauthenticated`] before any network I/O.
//! - Any call that carried a token and was answered with `401`/`403` clears
//!   the session and fails with [`ApiError::Unauthorized`].
//! - [`Access::Optional`] calls attach the token when one is held.
//!
//! # Endpoints
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | `/auth/login` | public |
//! | POST | `/auth/register` | public |
//! | GET | `/categories` | optional |
//! | POST | `/categories` | required |
//! | DELETE | `/categories/:id` | required |
//! | GET | `/products?categoryId=` | optional |
//! | POST | `/products` | required |
//! | PATCH | `/products/:id` | required |
//! | DELETE | `/products/:id` | required |
//! | GET | `/users/profile` | required |
//! | PATCH | `/user` | required |

mod types;

pub use types::{
    Category, CategoryFilter, CategoryRef, Product, ProductInput, ProfileUpdate, UserProfile,
};

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use url::Url;

use shopkeep_core::{CategoryId, Email, LoginIdentifier, Password, ProductId, Username};

use crate::config::ClientConfig;
use crate::session::{Session, SessionError};

use types::{AccessTokenResponse, CategoryInput, LoginRequest, RegisterRequest};

/// Maximum number of body characters included in logs.
const LOG_BODY_CHARS: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A protected call was attempted without a session token. No request was sent.
    #[error("Not signed in")]
    Unauthenticated,

    /// The backend rejected the session token. The session has been cleared.
    #[error("Session rejected by server ({status})")]
    Unauthorized { status: u16 },

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {}", message.as_deref().unwrap_or("(no message)"))]
    Backend {
        status: u16,
        message: Option<String>,
    },

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// The session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Whether this error means the user has to sign in again.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized { .. })
    }

    /// The backend-provided message, if the backend provided one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// How a request relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Never send the token (login, register).
    Public,
    /// Send the token when one is held.
    Optional,
    /// Refuse to send without a token.
    Required,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront backend.
///
/// Cheaply cloneable; clones share one connection pool and one session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot carry a path.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.api_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// The session this client authorizes requests with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Build an endpoint URL below the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request under the session policy and return the response body.
    async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access: Access,
    ) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let token: Option<SecretString> = match access {
            Access::Public => None,
            Access::Optional => self.inner.session.token(),
            Access::Required => {
                let Some(token) = self.inner.session.token() else {
                    warn!(%method, path = url.path(), "Protected request without a session");
                    return Err(ApiError::Unauthenticated);
                };
                Some(token)
            }
        };

        let mut request = self.inner.client.request(method, url.clone());
        if let Some(token) = &token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) && token.is_some() {
            warn!(%status, path = url.path(), "Session token rejected, signing out");
            // Session::logout clears the in-memory token even when storage fails.
            if let Err(e) = self.inner.session.logout() {
                error!(error = %e, "Failed to remove rejected session token");
            }
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = extract_message(&text);
            if status.is_server_error() {
                error!(
                    %status,
                    path = url.path(),
                    body = %text.chars().take(LOG_BODY_CHARS).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                debug!(%status, path = url.path(), ?message, "Backend rejected request");
            }
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }

    /// Send a request and decode a JSON response.
    async fn send_json<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access: Access,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.send(method, url, body, access).await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a session token.
    ///
    /// Does not touch the session; the caller decides what to do with the token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Backend` if the credentials are rejected.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        identifier: &LoginIdentifier,
        password: &Password,
    ) -> Result<SecretString, ApiError> {
        let body = match identifier {
            LoginIdentifier::Email(email) => LoginRequest {
                email: Some(email.as_str()),
                username: None,
                password: password.expose(),
            },
            LoginIdentifier::Username(username) => LoginRequest {
                email: None,
                username: Some(username.as_str()),
                password: password.expose(),
            },
        };

        let response: AccessTokenResponse = self
            .send_json(
                Method::POST,
                self.endpoint(&["auth", "login"])?,
                Some(&body),
                Access::Public,
            )
            .await?;
        Ok(response.into())
    }

    /// Create an account and receive its session token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Backend` if the backend refuses the registration.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn register(
        &self,
        username: &Username,
        email: &Email,
        password: &Password,
    ) -> Result<SecretString, ApiError> {
        let body = RegisterRequest {
            username: username.as_str(),
            email: email.as_str(),
            password: password.expose(),
        };

        let response: AccessTokenResponse = self
            .send_json(
                Method::POST,
                self.endpoint(&["auth", "register"])?,
                Some(&body),
                Access::Public,
            )
            .await?;
        Ok(response.into())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.send_json::<_, ()>(
            Method::GET,
            self.endpoint(&["categories"])?,
            None,
            Access::Optional,
        )
        .await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        self.send_json(
            Method::POST,
            self.endpoint(&["categories"])?,
            Some(&CategoryInput { name }),
            Access::Required,
        )
        .await
    }

    /// Delete a category. The backend also deletes its products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ApiError> {
        let id = id.to_string();
        self.send::<()>(
            Method::DELETE,
            self.endpoint(&["categories", &id])?,
            None,
            Access::Required,
        )
        .await
        .map(drop)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(filter = %filter))]
    pub async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        if let Some(id) = filter.category_id() {
            url.query_pairs_mut()
                .append_pair("categoryId", &id.to_string());
        }
        self.send_json::<_, ()>(Method::GET, url, None, Access::Optional)
            .await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            self.endpoint(&["products"])?,
            Some(input),
            Access::Required,
        )
        .await
        .map(drop)
    }

    /// Replace the editable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update_product(&self, id: &ProductId, input: &ProductInput) -> Result<(), ApiError> {
        let id = id.to_string();
        self.send(
            Method::PATCH,
            self.endpoint(&["products", &id])?,
            Some(input),
            Access::Required,
        )
        .await
        .map(drop)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let id = id.to_string();
        self.send::<()>(
            Method::DELETE,
            self.endpoint(&["products", &id])?,
            None,
            Access::Required,
        )
        .await
        .map(drop)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.send_json::<_, ()>(
            Method::GET,
            self.endpoint(&["users", "profile"])?,
            None,
            Access::Required,
        )
        .await
    }

    /// Save the user-editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` without a session, or an error if
    /// the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.send(
            Method::PATCH,
            self.endpoint(&["user"])?,
            Some(update),
            Access::Required,
        )
        .await
        .map(drop)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"message": "..."}`, `{"message": ["...", "..."]}` (joined
/// with `; `) and `{"error": "..."}`. Anything else yields `None`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let message = match value.get("message") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(serde_json::Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    };

    message
        .or_else(|| value.get("error").and_then(serde_json::Value::as_str).map(str::to_owned))
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::session::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(Url::parse(base).unwrap(), PathBuf::from("unused"));
        let session = Session::open(Arc::new(MemoryTokenStore::new())).unwrap();
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_extract_message_string() {
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials","statusCode":401}"#),
            Some("Invalid credentials".to_owned())
        );
    }

    #[test]
    fn test_extract_message_array() {
        assert_eq!(
            extract_message(r#"{"message":["email must be an email","password too short"]}"#),
            Some("email must be an email; password too short".to_owned())
        );
    }

    #[test]
    fn test_extract_message_fallbacks() {
        assert_eq!(
            extract_message(r#"{"error":"Conflict"}"#),
            Some("Conflict".to_owned())
        );
        assert_eq!(extract_message(r#"{"message":""}"#), None);
        assert_eq!(extract_message("<html>oops</html>"), None);
        assert_eq!(extract_message(""), None);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("http://localhost:3000/api/");
        assert_eq!(
            api.endpoint(&["users", "profile"]).unwrap().as_str(),
            "http://localhost:3000/api/users/profile"
        );

        let api = client("http://localhost:3000");
        assert_eq!(
            api.endpoint(&["products", "a b"]).unwrap().as_str(),
            "http://localhost:3000/products/a%20b"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Backend {
            status: 409,
            message: Some("Name taken".to_owned()),
        };
        assert_eq!(err.to_string(), "API error: 409 - Name taken");
        assert!(ApiError::Unauthenticated.is_auth_failure());
        assert!(ApiError::Unauthorized { status: 401 }.is_auth_failure());
        assert!(!err.is_auth_failure());
        assert_eq!(err.backend_message(), Some("Name taken"));
    }

    #[tokio::test]
    async fn test_required_call_without_session_sends_nothing() {
        // Port 9 (discard) is never contacted: the call must fail before I/O.
        let api = client("http://127.0.0.1:9");
        let err = api.get_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }
}
