// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! WicOsintX: OSINT lookup dispatcher
//!
//! Runs one lookup from the command line and streams the results panel to
//! stdout, or serves the web UI with its live results panel.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{error, info, warn};

use wicosintx::browser::open_url;
use wicosintx::config::AppConfig;
use wicosintx::credentials::{CredentialStore, KNOWN_KEYS};
use wicosintx::lookups::{InputKind, LookupContext, LookupRegistry};
use wicosintx::panel::{Line, PanelEvent, ResultsPanel, Tag};
use wicosintx::{Result, WicError};

/// WicOsintX CLI - OSINT lookup dispatcher
#[derive(Parser, Debug)]
#[command(name = "wicosintx")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Query OSINT services for people, IPs, domains, emails, usernames, phones and images", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search engines, social networks and dorks for a name or ID
    Person {
        /// Name or national ID (several words are joined)
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Look up an IP address
    Ip {
        ip: String,

        #[arg(short, long, default_value = "ipinfo", value_parser = ["ipinfo", "abstractapi", "shodan", "censys"])]
        provider: String,
    },

    /// WHOIS lookup for a domain
    Domain { domain: String },

    /// Breach search or validation for an email address
    Email {
        email: String,

        #[arg(short, long, default_value = "dehashed", value_parser = ["dehashed", "abstractapi"])]
        provider: String,
    },

    /// Check social profiles for a username
    Username { username: String },

    /// Validate a phone number
    Phone {
        number: String,

        #[arg(short, long, default_value = "veriphone", value_parser = ["veriphone", "abstractapi"])]
        provider: String,
    },

    /// Extract image metadata, or start a reverse image search
    Image {
        /// Image file to analyze
        #[arg(required_unless_present = "reverse")]
        path: Option<PathBuf>,

        /// Reverse image search instead of metadata extraction
        #[arg(long, conflicts_with = "path")]
        reverse: bool,

        /// Open result links in the browser
        #[arg(long)]
        open: bool,
    },

    /// Run any lookup by its service id
    Run {
        /// Service id (see `wicosintx services`)
        service: String,

        /// Identifier to look up
        input: Vec<String>,

        /// Open result links in the browser
        #[arg(long)]
        open: bool,
    },

    /// List available lookups
    Services,

    /// Manage API keys
    Keys {
        #[command(subcommand)]
        action: KeysCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Serve the web UI
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommands {
    /// Show stored keys (masked)
    List,

    /// Store a key
    Set { key: String, value: String },

    /// Remove a key
    Unset { key: String },

    /// Print the credentials file location
    Path,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    // Logs go to stderr so json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;
    let output = Output::new(&cli.format, cli.quiet);

    match cli.command {
        Some(Commands::Person { query }) => {
            run_lookup(config, "person-search", &query.join(" "), false, output).await
        }
        Some(Commands::Ip { ip, provider }) => {
            run_lookup(config, &format!("ip-{}", provider), &ip, false, output).await
        }
        Some(Commands::Domain { domain }) => {
            run_lookup(config, "domain-whois", &domain, false, output).await
        }
        Some(Commands::Email { email, provider }) => {
            run_lookup(config, &format!("email-{}", provider), &email, false, output).await
        }
        Some(Commands::Username { username }) => {
            run_lookup(config, "username-presence", &username, false, output).await
        }
        Some(Commands::Phone { number, provider }) => {
            run_lookup(config, &format!("phone-{}", provider), &number, false, output).await
        }
        Some(Commands::Image { path, reverse, open }) => {
            let (service, input) = image_request(path.as_deref(), reverse);
            run_lookup(config, service, &input, open, output).await
        }
        Some(Commands::Run { service, input, open }) => {
            run_lookup(config, &service, &input.join(" "), open, output).await
        }
        Some(Commands::Services) => run_services(output),
        Some(Commands::Keys { action }) => run_keys_command(config, action),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        Some(Commands::Serve { host, port, open }) => {
            run_serve(config, host, port, open, cli.quiet).await
        }
        None => {
            // Default: serve the web UI
            run_serve(config, None, None, false, cli.quiet).await
        }
    }
}

fn image_request(path: Option<&Path>, reverse: bool) -> (&'static str, String) {
    match path {
        Some(path) if !reverse => ("image-exif", path.to_string_lossy().into_owned()),
        _ => ("image-reverse", String::new()),
    }
}

/// How panel lines reach stdout
#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

#[derive(Debug, Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn new(format: &str, quiet: bool) -> Self {
        let format = match format {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            _ => OutputFormat::Text,
        };
        Self { format, quiet }
    }
}

/// A panel line with its link resolved, for machine-readable output
#[derive(Debug, Serialize)]
struct OutputLine {
    text: String,
    tag: Option<Tag>,
    url: Option<String>,
    created_at: DateTime<Utc>,
}

impl OutputLine {
    fn from_line(line: Line, panel: &ResultsPanel) -> Self {
        let url = line.link.as_deref().and_then(|link| panel.resolve(link));
        Self {
            text: line.text,
            tag: line.tag,
            url,
            created_at: line.created_at,
        }
    }
}

/// Prints lines as they arrive; `json` collects them into one array
struct Printer {
    output: Output,
    panel: ResultsPanel,
    collected: Vec<OutputLine>,
}

impl Printer {
    fn new(output: Output, panel: ResultsPanel) -> Self {
        Self {
            output,
            panel,
            collected: Vec::new(),
        }
    }

    fn print(&mut self, line: Line) -> Result<()> {
        if self.output.quiet && line.tag == Some(Tag::Pending) {
            return Ok(());
        }

        let line = OutputLine::from_line(line, &self.panel);
        match self.output.format {
            OutputFormat::Text => {
                println!("{}", line.text);
                if let Some(url) = &line.url {
                    println!("   🔗 {}", url);
                }
            }
            OutputFormat::Jsonl => println!("{}", serde_json::to_string(&line)?),
            OutputFormat::Json => self.collected.push(line),
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if self.output.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&self.collected)?);
        }
        Ok(())
    }
}

/// Run one lookup, streaming panel lines until every probe has finished
async fn run_lookup(
    config: AppConfig,
    service: &str,
    input: &str,
    open_links: bool,
    output: Output,
) -> Result<()> {
    let registry = LookupRegistry::new();
    let (lookup, input) = registry.validate(service, input)?;

    let credentials = CredentialStore::load(&config.credentials_path)?;
    let panel = ResultsPanel::new();
    let mut events = panel.subscribe();
    let ctx = LookupContext::new(Arc::new(config), Arc::new(credentials), panel.clone())?
        .with_open_links(open_links);
    let mut printer = Printer::new(output, panel);

    let run = async {
        registry.dispatch(&ctx, lookup.id(), input).await?;
        ctx.wait_pending().await;
        Ok::<(), WicError>(())
    };
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            event = events.recv() => match event {
                Ok(PanelEvent::Line(line)) => printer.print(line)?,
                Ok(PanelEvent::Cleared) => {}
                Err(RecvError::Lagged(skipped)) => warn!("{} lines dropped from output", skipped),
                Err(RecvError::Closed) => {}
            },
        }
    };

    // Lines written after the last poll
    loop {
        match events.try_recv() {
            Ok(PanelEvent::Line(line)) => printer.print(line)?,
            Ok(PanelEvent::Cleared) => {}
            Err(TryRecvError::Lagged(skipped)) => warn!("{} lines dropped from output", skipped),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    printer.finish()?;
    result
}

fn run_services(output: Output) -> Result<()> {
    let registry = LookupRegistry::new();

    if output.format != OutputFormat::Text {
        println!("{}", serde_json::to_string_pretty(&registry.describe())?);
        return Ok(());
    }

    for kind in InputKind::ALL {
        println!("{}:", kind.label());
        for lookup in registry.for_kind(kind) {
            println!("  {:<20} {}", lookup.id(), lookup.label());
        }
    }
    Ok(())
}

fn run_keys_command(config: AppConfig, action: KeysCommands) -> Result<()> {
    let mut credentials = CredentialStore::load(&config.credentials_path)?;

    match action {
        KeysCommands::List => {
            let mut keys: Vec<&str> = KNOWN_KEYS.to_vec();
            keys.extend(credentials.keys().filter(|k| !KNOWN_KEYS.contains(k)));
            for key in keys {
                let value = credentials
                    .masked(key)
                    .unwrap_or_else(|| "(not set)".to_string());
                println!("{:<20} {}", key, value);
            }
        }
        KeysCommands::Set { key, value } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("'{}' is not used by any lookup", key);
            }
            credentials.set(&key, value.trim());
            credentials.save()?;
            println!("Stored {}", key);
        }
        KeysCommands::Unset { key } => {
            if credentials.remove(&key) {
                credentials.save()?;
                println!("Removed {}", key);
            } else {
                println!("{} was not set", key);
            }
        }
        KeysCommands::Path => {
            println!("{}", credentials.path().display());
        }
    }

    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output, force } => {
            if output.exists() && !force {
                return Err(WicError::Config(format!(
                    "{:?} already exists. Use --force to overwrite",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Credentials: {}", config.credentials_path);
            println!("  Web UI: http://{}", config.web_addr());
            println!("  whois: {}", config.tools.whois);
            println!("  exiftool: {}", config.tools.exiftool);
            println!(
                "  browser: {}",
                config.tools.browser.as_deref().unwrap_or("(system default)")
            );
        }
    }

    Ok(())
}

async fn run_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    open: bool,
    quiet: bool,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }

    if !quiet {
        info!("WicOsintX v1.0.0 - OSINT lookup dispatcher");
    }

    let credentials = CredentialStore::load(&config.credentials_path)?;
    info!("Credentials: {}", credentials.path().display());

    if open {
        let url = format!("http://{}", config.web_addr());
        if let Err(e) = open_url(config.tools.browser.as_deref(), &url) {
            error!("Failed to open browser: {}", e);
        }
    }

    wicosintx::web::start_server(config, credentials).await
}
