//! Mera Bestie CLI - Storefront cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart, optionally with a coupon applied
//! bestie cart show --coupon SAVE20
//!
//! # Add two units of a product
//! bestie cart add 66f0a1 -q 2
//!
//! # Change a quantity by a delta, or remove a line
//! bestie cart qty 66f0a1 -1
//! bestie cart remove 66f0a1
//!
//! # Sign in (merges the guest cart) and out
//! bestie login u-42
//! bestie logout
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the cart
//! - `coupon` - Verify a coupon code
//! - `login` / `logout` - Switch between guest and signed-in carts
//! - `recent` - Recently viewed products

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use bestie_storefront::{CartError, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "bestie")]
#[command(author, version, about = "Mera Bestie storefront cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Verify a coupon code against the current cart
    Coupon {
        /// Coupon code
        code: String,
    },
    /// Sign in, merging the guest cart into the account cart
    Login {
        /// Backend user ID
        user_id: String,
    },
    /// Sign out
    Logout,
    /// List recently viewed products
    Recent,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show items and totals
    Show {
        /// Apply a coupon before computing totals
        #[arg(long)]
        coupon: Option<String>,
    },
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: String,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity by a delta
    Qty {
        /// Product ID or cart line ID
        key: String,

        /// Amount to add (negative to remove units)
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Remove a line
    Remove {
        /// Product ID or cart line ID
        key: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays
/// readable.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bestie_storefront=info,bestie_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::failure(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            output::failure(&e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CartError> {
    let app = commands::App::new(config)?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show { coupon } => commands::cart::show(&app, coupon.as_deref()).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&app, &product_id, quantity).await?,
            CartAction::Qty { key, delta } => commands::cart::change(&app, &key, delta).await?,
            CartAction::Remove { key } => commands::cart::remove(&app, &key).await?,
        },
        Commands::Coupon { code } => commands::cart::show(&app, Some(&code)).await?,
        Commands::Login { user_id } => commands::account::login(&app, &user_id).await?,
        Commands::Logout => commands::account::logout(&app).await?,
        Commands::Recent => commands::recent::list(&app),
    }
    Ok(())
}
