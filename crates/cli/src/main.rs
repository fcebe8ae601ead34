//! Shopkeep CLI - manage a storefront catalog from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from --password or SHOPKEEP_PASSWORD)
//! shopkeep login a@b.com --password secret1
//!
//! # List products, optionally in one category
//! shopkeep catalog --category 3
//!
//! # Add a product
//! shopkeep product add --name Mug --price 4.50 --stock 10 --category 3
//!
//! # Delete a category and its products without prompting
//! shopkeep category delete 3 --yes
//!
//! # Edit the profile bio
//! shopkeep profile edit --bio "Hello"
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` - Manage the session
//! - `open` - Resolve a route through the route guard and show it
//! - `catalog` - Show categories and products
//! - `category add|delete` - Manage categories
//! - `product add|edit|delete` - Manage products
//! - `profile show|edit` - View and edit the signed-in user's profile

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopkeep_client::{AppContext, ClientConfig};

mod commands;
mod render;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shopkeep")]
#[command(author, version, about = "Shopkeep storefront management")]
struct Cli {
    /// Backend base URL (overrides `SHOPKEEP_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides `SHOPKEEP_SESSION_FILE`)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an email address or username
    Login {
        /// Email address or username
        identifier: String,

        #[arg(long, env = "SHOPKEEP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        username: String,

        email: String,

        #[arg(long, env = "SHOPKEEP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Open a route (e.g. `/profile`) through the route guard
    Open {
        path: String,
    },
    /// Show categories and products
    Catalog {
        /// Category id, or `All`
        #[arg(short, long, default_value = "All")]
        category: String,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Add a category
    Add { name: String },
    /// Delete a category and all of its products
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct ProductFields {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<String>,

    /// Whole number; required when editing a product with no stock on record
    #[arg(long)]
    stock: Option<String>,

    /// Category id, as listed by `shopkeep catalog`
    #[arg(long)]
    category: Option<String>,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Edit a product; omitted fields keep their current value
    Edit {
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your profile
    Show,
    /// Change profile fields
    Edit {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        bio: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry: errors and warnings become events,
/// info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr().lock(), "error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopkeep_client=info,shopkeep_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            let _ = writeln!(std::io::stderr().lock(), "error: {e}");
            e.exit_code()
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = &cli.session_file {
        config.session_file.clone_from(path);
    }
    Ok(config)
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Login {
            identifier,
            password,
        } => commands::auth::login(&ctx, identifier, password).await,
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&ctx, username, email, password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Open { path } => commands::auth::open(&ctx, &path).await,
        Commands::Catalog { category } => commands::catalog::show(&ctx, &category).await,
        Commands::Category { action } => match action {
            CategoryAction::Add { name } => commands::catalog::add_category(&ctx, &name).await,
            CategoryAction::Delete { id, yes } => {
                commands::catalog::delete_category(&ctx, &id, yes).await
            }
        },
        Commands::Product { action } => match action {
            ProductAction::Add { fields } => {
                commands::catalog::add_product(&ctx, fields.into()).await
            }
            ProductAction::Edit { id, fields } => {
                commands::catalog::edit_product(&ctx, &id, fields.into()).await
            }
            ProductAction::Delete { id, yes } => {
                commands::catalog::delete_product(&ctx, &id, yes).await
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&ctx).await,
            ProfileAction::Edit {
                username,
                email,
                bio,
            } => {
                commands::profile::edit(
                    &ctx,
                    commands::profile::ProfileEdits {
                        username,
                        email,
                        bio,
                    },
                )
                .await
            }
        },
    }
}

impl From<ProductFields> for commands::catalog::ProductEdits {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            category: fields.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
