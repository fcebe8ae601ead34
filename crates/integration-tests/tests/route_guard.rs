//! Route guard and authorization failures.

#![allow(clippy::unwrap_used)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use shopkeep_client::api::{ApiError, ProductInput};
use shopkeep_client::session::{MemoryTokenStore, SessionError, TokenStore};
use shopkeep_client::views::{CatalogView, ProductForm, ProfileView};
use shopkeep_client::{AppContext, Route, ViewError};
use shopkeep_core::{CategoryId, Price, ProductId, Stock};
use shopkeep_integration_tests::{ScriptedConfirm, TOKEN, TestContext};

#[tokio::test]
async fn test_protected_operations_without_token_send_nothing() {
    let ctx = TestContext::bare().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.server)
        .await;
    let app = ctx.app();

    assert_eq!(
        CatalogView::open(app.clone()).await.unwrap_err(),
        ViewError::Redirected(Route::Login)
    );
    assert_eq!(
        ProfileView::open(app.clone()).await.unwrap_err(),
        ViewError::Redirected(Route::Login)
    );

    let api = app.api();
    assert!(matches!(
        api.create_category("Tools").await,
        Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(
        api.delete_category(&CategoryId::from(1)).await,
        Err(ApiError::Unauthenticated)
    ));
    let input = ProductInput {
        name: "Hammer".to_owned(),
        description: String::new(),
        price: Price::from_cents(1_000),
        stock: Stock::new(1),
        category_id: CategoryId::from(1),
    };
    assert!(matches!(
        api.create_product(&input).await,
        Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(
        api.update_product(&ProductId::from(10), &input).await,
        Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(
        api.delete_product(&ProductId::from(10)).await,
        Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(
        api.get_profile().await,
        Err(ApiError::Unauthenticated)
    ));

    assert!(ctx.requests().await.is_empty());
    assert_eq!(app.route(), Route::Login);
}

#[tokio::test]
async fn test_session_lost_mid_use_redirects_before_request() {
    let ctx = TestContext::start().await;
    let app = ctx.app_with_token(TOKEN);
    let mut catalog = CatalogView::open(app.clone()).await.unwrap();

    // Another front end signed out; this view still exists.
    app.session().logout().unwrap();
    let before = ctx.requests().await.len();

    let form = ProductForm {
        name: "Hammer".to_owned(),
        price: "10".to_owned(),
        stock: "1".to_owned(),
        category: "1".to_owned(),
        ..ProductForm::default()
    };
    assert_eq!(
        catalog.create_product(&form).await.unwrap_err(),
        ViewError::Redirected(Route::Login)
    );
    assert_eq!(
        catalog
            .delete_category(&CategoryId::from(1), &ScriptedConfirm::accept())
            .await
            .unwrap_err(),
        ViewError::Redirected(Route::Login)
    );
    assert_eq!(ctx.requests().await.len(), before);
    assert_eq!(app.route(), Route::Login);
}

#[tokio::test]
async fn test_rejected_token_clears_session_and_redirects() {
    let ctx = TestContext::start().await;
    let app = ctx.app_with_token("expired");

    // Reads accept any caller, so the catalog still opens.
    let mut catalog = CatalogView::open(app.clone()).await.unwrap();
    assert_eq!(catalog.categories().len(), 2);

    let err = catalog.create_category("Tools").await.unwrap_err();
    assert_eq!(err, ViewError::Redirected(Route::Login));
    assert!(!app.session().is_authenticated());
    assert_eq!(app.route(), Route::Login);
    assert!(ctx.backend.state().categories.iter().all(|c| c.name != "Tools"));

    // The token is gone from disk as well.
    assert!(!ctx.app().session().is_authenticated());
}

#[tokio::test]
async fn test_forbidden_profile_read_signs_out() {
    let ctx = TestContext::start().await;
    let app = ctx.app_with_token(TOKEN);
    ctx.backend.state().fail_next = Some((403, serde_json::json!({ "message": "Forbidden" })));

    assert_eq!(
        ProfileView::open(app.clone()).await.unwrap_err(),
        ViewError::Redirected(Route::Login)
    );
    assert!(!app.session().is_authenticated());
}

#[tokio::test]
async fn test_paths_resolve_through_guard() {
    let ctx = TestContext::bare().await;
    let anonymous = ctx.app();
    assert_eq!(anonymous.navigate(Route::from_path("/")), Route::Login);
    assert_eq!(anonymous.navigate(Route::from_path("/profile")), Route::Login);
    assert_eq!(
        anonymous.navigate(Route::from_path("/register")),
        Route::Register
    );

    let signed_in = ctx.app_with_token(TOKEN);
    assert_eq!(signed_in.navigate(Route::from_path("/")), Route::Catalog);
    assert_eq!(
        signed_in.navigate(Route::from_path("/nowhere")),
        Route::Catalog
    );
    assert_eq!(
        signed_in.navigate(Route::from_path("/profile")),
        Route::Profile
    );
}

/// Token store whose file can be read and written but never removed.
struct UndeletableStore(MemoryTokenStore);

impl TokenStore for UndeletableStore {
    fn load(&self) -> Result<Option<SecretString>, SessionError> {
        self.0.load()
    }

    fn save(&self, token: &SecretString) -> Result<(), SessionError> {
        self.0.save(token)
    }

    fn clear(&self) -> Result<(), SessionError> {
        Err(SessionError::Io {
            path: PathBuf::from("session.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

#[tokio::test]
async fn test_rejected_token_redirects_even_if_store_cannot_clear() {
    let ctx = TestContext::start().await;
    let store = UndeletableStore(MemoryTokenStore::with_token("expired"));
    let app = AppContext::with_store(ctx.config(), Arc::new(store)).unwrap();
    let mut catalog = CatalogView::open(app.clone()).await.unwrap();

    assert!(matches!(
        app.api().create_category("Tools").await,
        Err(ApiError::Unauthorized { status: 401 })
    ));
    assert!(!app.session().is_authenticated());

    app.session()
        .login(SecretString::from("expired".to_owned()))
        .unwrap();
    let err = catalog.create_category("Tools").await.unwrap_err();
    assert_eq!(err, ViewError::Redirected(Route::Login));
    assert_eq!(app.route(), Route::Login);
    assert!(!app.session().is_authenticated());
    assert_eq!(catalog.notice(), None);
}
