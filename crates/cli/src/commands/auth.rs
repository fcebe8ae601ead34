//! Session commands: login, register, logout and route opening.

use shopkeep_client::views::{LoginView, RegisterView};
use shopkeep_client::{AppContext, Route};

use super::{CliError, emit};

/// Sign in and store the session token.
pub async fn login(ctx: &AppContext, identifier: String, password: String) -> Result<(), CliError> {
    let mut view = LoginView::open(ctx.clone());
    let form = view.form_mut();
    form.identifier = identifier;
    form.password = password;

    let route = view.submit().await?;
    tracing::info!(%route, "Signed in");
    emit(&format!("Signed in. Now at {route}."))
}

/// Create an account and store its session token.
pub async fn register(
    ctx: &AppContext,
    username: String,
    email: String,
    password: String,
) -> Result<(), CliError> {
    let mut view = RegisterView::open(ctx.clone());
    let form = view.form_mut();
    form.username = username;
    form.email = email;
    form.password = password;

    let route = view.submit().await?;
    emit(&format!("Account created. Now at {route}."))
}

/// Forget the stored session.
pub fn logout(ctx: &AppContext) -> Result<(), CliError> {
    ctx.logout()?;
    emit("Signed out.")
}

/// Resolve `path` through the route guard and show where it lands.
pub async fn open(ctx: &AppContext, path: &str) -> Result<(), CliError> {
    match ctx.navigate(Route::from_path(path)) {
        Route::Catalog => super::catalog::show(ctx, "All").await,
        Route::Profile => super::profile::show(ctx).await,
        route @ (Route::Login | Route::Register) => {
            let command = route.path().trim_start_matches('/');
            emit(&format!("{route}: run `shopkeep {command}` to continue."))
        }
    }
}
