//! Integration tests for Shopkeep.
//!
//! The tests drive the client's views against [`FakeBackend`], a stateful
//! in-memory storefront backend served by `wiremock`, and persist sessions
//! in `tempfile` directories. Nothing leaves localhost.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopkeep-integration-tests
//! ```
//!
//! # Fixture Data
//!
//! - User `ada` / `a@b.com`, password `secret1`, token `tok123`
//! - Categories `1 Kitchen`, `2 Garden`
//! - Products `10 Mug` and `11 Teapot` (Kitchen), `20 Trowel` (Garden)
//!
//! Ids are JSON integers unless [`BackendState::with_string_ids`] is used,
//! in which case every id goes out and must come back as a JSON string.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use shopkeep_client::session::FileTokenStore;
use shopkeep_client::{AppContext, ClientConfig};

pub const TOKEN: &str = "tok123";
pub const EMAIL: &str = "a@b.com";
pub const USERNAME: &str = "ada";
pub const PASSWORD: &str = "secret1";

/// A category row.
#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
}

/// A product row.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category_id: i64,
}

/// Everything the fake backend stores.
#[derive(Debug)]
pub struct BackendState {
    /// Token accepted on protected endpoints.
    pub token: String,
    pub categories: Vec<CategoryRecord>,
    pub products: Vec<ProductRecord>,
    pub profile: Value,
    /// Body of the last `PATCH /user`.
    pub last_profile_update: Option<Value>,
    /// Answer the next request with this status and body instead.
    pub fail_next: Option<(u16, Value)>,
    /// Serve and expect ids as JSON strings.
    pub string_ids: bool,
    next_id: i64,
}

impl Default for BackendState {
    fn default() -> Self {
        let product = |id, name: &str, price, stock, category_id| ProductRecord {
            id,
            name: name.to_owned(),
            description: String::new(),
            price,
            stock,
            category_id,
        };
        Self {
            token: TOKEN.to_owned(),
            categories: vec![
                CategoryRecord {
                    id: 1,
                    name: "Kitchen".to_owned(),
                },
                CategoryRecord {
                    id: 2,
                    name: "Garden".to_owned(),
                },
            ],
            products: vec![
                product(10, "Mug", 4.5, 10, 1),
                product(11, "Teapot", 20.0, 2, 1),
                product(20, "Trowel", 7.25, 5, 2),
            ],
            profile: json!({
                "username": USERNAME,
                "email": EMAIL,
                "bio": null,
                "createdAt": "2024-03-05T10:00:00.000Z"
            }),
            last_profile_update: None,
            fail_next: None,
            string_ids: false,
            next_id: 100,
        }
    }
}

impl BackendState {
    /// Fixture data whose ids are strings on the wire.
    pub fn with_string_ids() -> Self {
        Self {
            string_ids: true,
            ..Self::default()
        }
    }

    fn id_json(&self, id: i64) -> Value {
        if self.string_ids {
            Value::String(id.to_string())
        } else {
            Value::from(id)
        }
    }

    /// Read an id from a request body, in the form this backend serves.
    fn read_id(&self, value: &Value) -> Option<i64> {
        if self.string_ids {
            value.as_str()?.parse().ok()
        } else {
            value.as_i64()
        }
    }

    fn category_json(&self, record: &CategoryRecord) -> Value {
        json!({ "id": self.id_json(record.id), "name": record.name })
    }

    /// Read a product payload; `None` if a field is missing or mistyped.
    fn product_fields(&self, body: &Value) -> Option<(String, String, f64, i64, i64)> {
        Some((
            str_field(body, "name")?.to_owned(),
            str_field(body, "description").unwrap_or_default().to_owned(),
            body.get("price")?.as_f64()?,
            body.get("stock")?.as_i64()?,
            self.read_id(body.get("categoryId")?)?,
        ))
    }

    fn product_json(&self, record: &ProductRecord) -> Value {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == record.category_id)
            .map(|c| json!({ "name": c.name }));
        json!({
            "id": self.id_json(record.id),
            "name": record.name,
            "description": record.description,
            "price": record.price,
            "stock": record.stock,
            "categoryId": self.id_json(record.category_id),
            "category": category
        })
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn authorized(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {}", self.token))
    }
}

/// Stateful fake of the storefront backend.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

fn respond(status: u16, body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

fn message(status: u16, text: &str) -> ResponseTemplate {
    respond(status, &json!({ "statusCode": status, "message": text }))
}

fn body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

impl FakeBackend {
    /// A backend serving `state`.
    pub fn new(state: BackendState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Lock the backend state for inspection or setup.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state();

        if let Some((status, body)) = state.fail_next.take() {
            return respond(status, &body);
        }

        let segments: Vec<&str> = request
            .url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let method = request.method.as_str();

        match (method, segments.as_slice()) {
            ("POST", ["auth", "login"]) => {
                let body = body(request);
                let known = str_field(&body, "email") == Some(EMAIL)
                    || str_field(&body, "username") == Some(USERNAME);
                if known && str_field(&body, "password") == Some(PASSWORD) {
                    respond(201, &json!({ "access_token": state.token }))
                } else {
                    message(401, "Invalid credentials")
                }
            }
            ("POST", ["auth", "register"]) => {
                let body = body(request);
                if str_field(&body, "username") == Some(USERNAME) {
                    message(409, "Username already exists")
                } else {
                    respond(201, &json!({ "access_token": state.token }))
                }
            }
            ("GET", ["categories"]) => {
                let list: Vec<Value> = state
                    .categories
                    .iter()
                    .map(|c| state.category_json(c))
                    .collect();
                respond(200, &Value::Array(list))
            }
            ("GET", ["products"]) => {
                let filter = request
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "categoryId")
                    .and_then(|(_, v)| v.parse::<i64>().ok());
                let list: Vec<Value> = state
                    .products
                    .iter()
                    .filter(|p| filter.is_none_or(|id| p.category_id == id))
                    .map(|p| state.product_json(p))
                    .collect();
                respond(200, &Value::Array(list))
            }
            _ if !state.authorized(request) => message(401, "Unauthorized"),
            ("POST", ["categories"]) => {
                let body = body(request);
                let Some(name) = str_field(&body, "name") else {
                    return message(400, "name should not be empty");
                };
                if state.categories.iter().any(|c| c.name == name) {
                    return message(409, "Category already exists");
                }
                let record = CategoryRecord {
                    id: state.allocate_id(),
                    name: name.to_owned(),
                };
                let json = state.category_json(&record);
                state.categories.push(record);
                respond(201, &json)
            }
            ("DELETE", ["categories", id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    return message(404, "Category not found");
                };
                let before = state.categories.len();
                state.categories.retain(|c| c.id != id);
                if state.categories.len() == before {
                    return message(404, "Category not found");
                }
                state.products.retain(|p| p.category_id != id);
                ResponseTemplate::new(200)
            }
            ("POST", ["products"]) => {
                let Some((name, description, price, stock, category_id)) =
                    state.product_fields(&body(request))
                else {
                    return message(400, "Invalid product");
                };
                let record = ProductRecord {
                    id: state.allocate_id(),
                    name,
                    description,
                    price,
                    stock,
                    category_id,
                };
                let json = state.product_json(&record);
                state.products.push(record);
                respond(201, &json)
            }
            ("PATCH", ["products", id]) => {
                let Some((name, description, price, stock, category_id)) =
                    state.product_fields(&body(request))
                else {
                    return message(400, "Invalid product");
                };
                let id = id.parse::<i64>().unwrap_or_default();
                let Some(record) = state.products.iter_mut().find(|p| p.id == id) else {
                    return message(404, "Product not found");
                };
                *record = ProductRecord {
                    id,
                    name,
                    description,
                    price,
                    stock,
                    category_id,
                };
                ResponseTemplate::new(200)
            }
            ("DELETE", ["products", id]) => {
                let id = id.parse::<i64>().unwrap_or_default();
                let before = state.products.len();
                state.products.retain(|p| p.id != id);
                if state.products.len() == before {
                    message(404, "Product not found")
                } else {
                    ResponseTemplate::new(200)
                }
            }
            ("GET", ["users", "profile"]) => respond(200, &state.profile.clone()),
            ("PATCH", ["user"]) => {
                let update = body(request);
                if let (Some(profile), Some(fields)) =
                    (state.profile.as_object_mut(), update.as_object())
                {
                    for (key, value) in fields {
                        profile.insert(key.clone(), value.clone());
                    }
                }
                state.last_profile_update = Some(update);
                respond(200, &state.profile.clone())
            }
            _ => message(404, "Not Found"),
        }
    }
}

impl Respond for FakeBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.handle(request)
    }
}

/// A running fake backend and a scratch directory for session files.
pub struct TestContext {
    pub server: MockServer,
    pub backend: FakeBackend,
    pub dir: TempDir,
}

impl TestContext {
    /// Start a backend serving the fixture data on every path.
    pub async fn start() -> Self {
        Self::start_with(BackendState::default()).await
    }

    /// Start a backend serving `state` on every path.
    pub async fn start_with(state: BackendState) -> Self {
        let server = MockServer::start().await;
        let backend = FakeBackend::new(state);
        Mock::given(any())
            .respond_with(backend.clone())
            .mount(&server)
            .await;
        Self {
            server,
            backend,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Start a backend with no mocks mounted; tests mount their own.
    pub async fn bare() -> Self {
        Self {
            server: MockServer::start().await,
            backend: FakeBackend::default(),
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// The session file used by [`TestContext::app`].
    pub fn session_file(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// Client configuration pointing at the mock server.
    pub fn config(&self) -> ClientConfig {
        let url = Url::parse(&self.server.uri()).expect("Mock server URI is a valid URL");
        ClientConfig::new(url, self.session_file())
    }

    /// A fresh client context with no session.
    pub fn app(&self) -> AppContext {
        AppContext::new(self.config()).expect("Failed to build app context")
    }

    /// A fresh client context already holding `token`.
    pub fn app_with_token(&self, token: &str) -> AppContext {
        let store = FileTokenStore::new(self.session_file());
        shopkeep_client::session::TokenStore::save(
            &store,
            &secrecy::SecretString::from(token.to_owned()),
        )
        .expect("Failed to seed session file");
        AppContext::with_store(self.config(), Arc::new(store)).expect("Failed to build app context")
    }

    /// Every request the server has seen.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests matching a method and path.
    pub async fn requests_to(&self, method: &str, path: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == method && r.url.path() == path)
            .collect()
    }
}

/// The bearer token a request carried, if any.
pub fn bearer(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Confirmation that always answers the same and records the prompts.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn accept() -> Self {
        Self {
            answer: true,
            prompts: Mutex::default(),
        }
    }

    pub fn decline() -> Self {
        Self {
            answer: false,
            prompts: Mutex::default(),
        }
    }

    /// Messages shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl shopkeep_client::views::Confirm for ScriptedConfirm {
    fn confirm(&self, message: &str) -> bool {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
        self.answer
    }
}
