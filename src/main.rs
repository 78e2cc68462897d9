//! Rule-driven HTTP redirect gateway.
//!
//! Matches incoming request paths against an ordered rule table and answers
//! with HTTP redirects (status-based or HTML meta-refresh); everything else
//! is forwarded to the configured upstream.
//!
//! ```text
//!                      ┌─────────────────────────────────────────────┐
//!                      │              REDIRECT GATEWAY               │
//!                      │                                             │
//!  Client Request      │  ┌─────────┐   ┌──────────┐   ┌──────────┐  │
//!  ────────────────────┼─▶│  http   │──▶│ redirect │──▶│ forward  │──┼──▶ Upstream
//!                      │  │ server  │   │  filter  │   │ handler  │  │
//!                      │  └─────────┘   └────┬─────┘   └──────────┘  │
//!                      │             match   │   (no match continues)│
//!  Redirect Response   │                     ▼                       │
//!  ◀───────────────────┼── 3xx + Location, or meta-refresh page      │
//!                      │                                             │
//!                      │  ┌───────────────────────────────────────┐  │
//!                      │  │        Cross-Cutting Concerns         │  │
//!                      │  │   config · observability · lifecycle  │  │
//!                      │  └───────────────────────────────────────┘  │
//!                      └─────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redirect_gateway::config::loader::load_config;
use redirect_gateway::config::watcher::RuleWatcher;
use redirect_gateway::{GatewayConfig, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "redirect-gateway")]
#[command(about = "Rule-driven HTTP redirect gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redirect_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("redirect-gateway v0.1.0 starting");

    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        tracing::warn!(path = ?args.config, "Config file not found, using defaults");
        GatewayConfig::default()
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = config.redirects.len(),
        upstream = %config.upstream.address,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    // Initialize metrics server
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            redirect_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Watch the config file for rule reloads. The notify watcher stops when
    // dropped, so the handle lives for the rest of main.
    let mut _watcher = None;
    let rule_updates = if args.config.exists() {
        let (watcher, updates) = RuleWatcher::new(&args.config).spawn()?;
        _watcher = Some(watcher);
        updates
    } else {
        let (_tx, updates) = mpsc::unbounded_channel();
        updates
    };

    let shutdown = Shutdown::new();
    shutdown.on_ctrl_c();

    // Create and run HTTP server
    let server = HttpServer::new(config);
    server
        .run(listener, rule_updates, shutdown.signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
