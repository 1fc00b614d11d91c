//! contact-relay server and operator CLI
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP server (default)
//! contact-relay serve
//!
//! # Check which mail transport would be used
//! contact-relay verify
//!
//! # Send one message through the configured transport
//! contact-relay send --to me@example.com --subject "Test" --text "Hello"
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use contact_relay::prelude::*;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "contact-relay")]
#[command(version)]
#[command(about = "Contact-form backend that relays submissions over SMTP", long_about = None)]
struct Cli {
    /// Configuration file, instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Resolve the mail transport and print the chosen variant
    Verify,
    /// Send one message and print the dispatch result as JSON
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Subject line
        #[arg(long)]
        subject: String,
        /// Plain text body
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init()?;
    let config = match &cli.config {
        Some(path) => RelayConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RelayConfig::load().context("loading configuration")?,
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Verify => verify(config).await,
        Commands::Send { to, subject, text } => send(config, to, subject, text).await,
    }
}

async fn serve(config: RelayConfig) -> Result<()> {
    let addr = config.server.bind_addr();
    let environment = config.server.environment;
    let state = RelayState::new(config);

    // Resolve in the background so the first submission does not pay for verification
    let warm = state.clone();
    tokio::spawn(async move {
        if let Err(err) = warm.selector().resolve().await {
            warn!(error = %err, "Mail transport unavailable at startup");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let keep_alive = KeepAlive::from_settings(&state.config().keep_alive)
        .map(|pinger| pinger.spawn(shutdown_rx));

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(%addr, ?environment, "Starting contact-relay");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = keep_alive {
        let _ = handle.await;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn verify(config: RelayConfig) -> Result<()> {
    let selector = TransportSelector::from_config(&config);
    match selector.resolve().await {
        Ok(handle) => {
            println!("{}", handle.kind());
            if !handle.kind().delivers() {
                warn!("Messages will be logged, not delivered");
            }
            Ok(())
        }
        Err(err) => bail!(err),
    }
}

async fn send(config: RelayConfig, to: String, subject: String, text: String) -> Result<()> {
    let state = RelayState::new(config);
    let request = MailRequest::new(to, subject).text(text);

    let result = state.dispatcher().dispatch(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let DispatchResult::Failure { user_message, .. } = result {
        bail!(user_message);
    }
    Ok(())
}
