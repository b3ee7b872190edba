//! CougarPost CLI - Sign in, price packages and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept under COUGARPOST_STATE_DIR)
//! cougarpost login -e pat@cougarpost.example --password "$PASSWORD"
//!
//! # Price a box
//! cougarpost quote package --kind box --weight 5 --size "Medium (50x40x30 cm)" --fragile
//!
//! # Buy from the store
//! cougarpost checkout cart --line 12:20:0.65:Stamp --line 4:1:32.00
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `screens` - Portal screens the signed-in role may open
//! - `quote` - Price a package or cart without ordering
//! - `checkout` - Price and submit a package or cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cougarpost_portal::config::PortalConfig;
use cougarpost_portal::{PortalError, PortalState};

mod commands;

use commands::pricing::{CartArgs, PackageArgs};

#[derive(Parser)]
#[command(name = "cougarpost")]
#[command(author, version, about = "CougarPost portal from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "COUGARPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List the screens available to the signed-in role
    Screens,
    /// Price without ordering
    Quote {
        #[command(subcommand)]
        target: Target,
    },
    /// Price and submit an order
    Checkout {
        #[command(subcommand)]
        target: Target,
    },
}

#[derive(Subcommand)]
enum Target {
    /// A package (envelope or box)
    Package(PackageArgs),
    /// Store products
    Cart(CartArgs),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
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

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cougarpost_portal=info,cougarpost_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report(&PortalError::from(e));
            return ExitCode::from(2);
        }
    };

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let result = match PortalState::new(config) {
        Ok(state) => run(&state, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_unexpected() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Command failed");
            } else {
                tracing::debug!(error = %e, "Command failed");
            }
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(state: &PortalState, command: Commands) -> cougarpost_portal::Result<()> {
    match command {
        Commands::Login { email, password } => {
            commands::session::login(state, &email, password).await
        }
        Commands::Logout => {
            commands::session::logout(state);
            Ok(())
        }
        Commands::Whoami => {
            commands::session::whoami(state);
            Ok(())
        }
        Commands::Screens => {
            commands::session::screens(state);
            Ok(())
        }
        Commands::Quote { target } => match target {
            Target::Package(args) => commands::pricing::quote_package(state, &args).await,
            Target::Cart(args) => commands::pricing::quote_cart(state, &args).await,
        },
        Commands::Checkout { target } => match target {
            Target::Package(args) => commands::pricing::checkout_package(state, &args).await,
            Target::Cart(args) => commands::pricing::checkout_cart(state, &args).await,
        },
    }
}

#[allow(clippy::print_stderr)]
fn report(error: &PortalError) {
    eprintln!("error: {}", error.user_message());
}
