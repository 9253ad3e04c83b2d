// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! WicOsintX Web UI
//!
//! Standalone web server for the lookup forms and live results panel.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use wicosintx::browser::open_url;
use wicosintx::config::AppConfig;
use wicosintx::credentials::CredentialStore;
use wicosintx::Result;

#[derive(Parser, Debug)]
#[command(name = "wicosintx-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "WicOsintX Web UI Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Credentials file (overrides config)
    #[arg(long)]
    keys: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open browser automatically
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("WicOsintX Web UI v1.0.0");

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(keys) = args.keys {
        config.credentials_path = keys.to_string_lossy().into_owned();
    }

    let credentials = CredentialStore::load(&config.credentials_path)?;
    info!("Credentials: {}", credentials.path().display());

    let addr = config.web_addr();
    info!("Starting web server at http://{}", addr);

    if args.open {
        let url = format!("http://{}", addr);
        if let Err(e) = open_url(config.tools.browser.as_deref(), &url) {
            error!("Failed to open browser: {}", e);
        }
    }

    wicosintx::web::start_server(config, credentials).await
}
