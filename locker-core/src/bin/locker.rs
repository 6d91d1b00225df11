//! Locker CLI - drive the setup and lock surfaces from a terminal.
//!
//! The sync store and local storage are emulated with JSON files in a state
//! directory, so a profile can be inspected or scripted without a browser.
//!
//! # Usage
//!
//! ```bash
//! # Register a PIN and turn the lock on
//! locker save pin --credential 1234 --confirm 1234
//! locker activate
//!
//! # Try to get past the overlay
//! locker unlock --attempt 1234
//!
//! # Register a pattern (cell indices in click order)
//! locker save pattern --pattern 0,4,8
//! locker unlock --pattern 0,4,8
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use locker_core::authenticator::NoAuthenticator;
use locker_core::lock::{LockSurface, Outcome};
use locker_core::setup::SetupSurface;
use locker_core::storage::JsonFileStore;
use locker_core::{LockerError, OverlayControls, UnlockMethod};

#[derive(Parser)]
#[command(name = "locker")]
#[command(about = "Page locker - register and verify unlock credentials")]
#[command(version)]
struct Cli {
    /// Directory holding sync.json and local.json
    #[arg(long, env = "LOCKER_STATE_DIR", default_value = ".locker")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stored configuration
    Status,

    /// Turn the lock on
    Activate,

    /// Turn the lock off
    Deactivate,

    /// Register a credential for a method
    Save {
        /// password, pin, pattern or fingerprint
        method: String,

        /// New password or PIN
        #[arg(short, long, default_value = "")]
        credential: String,

        /// Confirmation of the password or PIN
        #[arg(long, default_value = "")]
        confirm: String,

        /// Pattern cells in click order, e.g. 0,4,8
        #[arg(short, long, value_delimiter = ',')]
        pattern: Vec<usize>,
    },

    /// Register this device's fingerprint
    RegisterFingerprint,

    /// Load the lock surface and submit one attempt
    Unlock {
        /// Password or PIN attempt
        #[arg(short, long)]
        attempt: Option<String>,

        /// Pattern attempt, e.g. 0,4,8
        #[arg(short, long, value_delimiter = ',')]
        pattern: Vec<usize>,
    },
}

type Setup = SetupSurface<JsonFileStore, JsonFileStore, NoAuthenticator>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "locker=info,locker_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let sync = JsonFileStore::new(cli.state_dir.join("sync.json"));
    let local = JsonFileStore::new(cli.state_dir.join("local.json"));

    match cli.command {
        Commands::Status => cmd_status(sync).await,
        Commands::Activate => cmd_active(sync, local, true).await,
        Commands::Deactivate => cmd_active(sync, local, false).await,
        Commands::Save {
            method,
            credential,
            confirm,
            pattern,
        } => cmd_save(sync, local, &method, &credential, &confirm, &pattern).await,
        Commands::RegisterFingerprint => cmd_register(sync, local).await,
        Commands::Unlock { attempt, pattern } => cmd_unlock(sync, attempt, &pattern).await,
    }
}

async fn open_setup(sync: JsonFileStore, local: JsonFileStore) -> Result<Setup> {
    let mut setup = SetupSurface::new(sync, local, NoAuthenticator);
    setup.open().await.context("reading locker state")?;
    Ok(setup)
}

async fn cmd_status(sync: JsonFileStore) -> Result<ExitCode> {
    let lock = LockSurface::new(sync, NoAuthenticator);
    let config = lock.settings().load_config().await?;

    println!("Active:     {}", config.active);
    println!("Method:     {}", config.method.as_deref().unwrap_or("(none)"));
    println!(
        "Credential: {}",
        if config.digest_hex.is_some() { "stored" } else { "(none)" }
    );
    println!(
        "Page load:  {}",
        if config.is_complete() { "locks" } else { "does not lock" }
    );
    Ok(ExitCode::SUCCESS)
}

async fn cmd_active(sync: JsonFileStore, local: JsonFileStore, active: bool) -> Result<ExitCode> {
    let mut setup = open_setup(sync, local).await?;
    setup.toggle_active(active).await?;
    println!("Locker {}", if active { "activated" } else { "deactivated" });
    Ok(ExitCode::SUCCESS)
}

async fn cmd_save(
    sync: JsonFileStore,
    local: JsonFileStore,
    method: &str,
    credential: &str,
    confirm: &str,
    pattern: &[usize],
) -> Result<ExitCode> {
    let method: UnlockMethod = method.parse()?;
    let mut setup = open_setup(sync, local).await?;
    setup.select_method(method)?;
    setup.set_new_credential(credential);
    setup.set_confirm_credential(confirm);
    for &cell in pattern {
        setup.select_cell(cell)?;
    }

    match setup.save().await {
        Ok(()) => {
            println!("{}", setup.status());
            Ok(ExitCode::SUCCESS)
        }
        Err(LockerError::Validation(_)) => {
            eprintln!("{}", setup.status());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_register(sync: JsonFileStore, local: JsonFileStore) -> Result<ExitCode> {
    let mut setup = open_setup(sync, local).await?;
    match setup.register_fingerprint().await {
        Ok(true) => {
            println!("{}", setup.status());
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(LockerError::Assertion(_)) => {
            eprintln!("{}", setup.status());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_unlock(
    sync: JsonFileStore,
    attempt: Option<String>,
    pattern: &[usize],
) -> Result<ExitCode> {
    let lock = LockSurface::new(sync, NoAuthenticator);
    let Some(mut overlay) = lock.on_page_load().await else {
        println!("Page is not locked");
        return Ok(ExitCode::SUCCESS);
    };

    println!("{}", overlay.heading());
    let outcome = match overlay.controls() {
        OverlayControls::TextEntry { .. } => {
            let attempt = attempt.unwrap_or_default();
            lock.submit_text(&mut overlay, &attempt).await?
        }
        OverlayControls::PatternGrid => {
            for &cell in pattern {
                overlay.select_cell(cell)?;
            }
            lock.submit_pattern(&mut overlay).await?
        }
        OverlayControls::Authenticate => lock.authenticate(&mut overlay).await,
    };

    if outcome == Outcome::Unlocked {
        println!("Unlocked");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", overlay.message());
        Ok(ExitCode::FAILURE)
    }
}
