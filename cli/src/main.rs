//! Tutoring billing service, CLI server
//!
//! ```sh
//! # Run with default config (~/.config/tutoring-billing/config.toml)
//! tutoring-service
//!
//! # Custom config path
//! tutoring-service --config /etc/tutoring-billing/config.toml
//!
//! # Validate config without starting
//! tutoring-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use tutoring_billing::config::{AppConfig, StorageBackend};
use tutoring_billing::server::{init_tracing, ServerHandle, ServerOptions};

/// Lesson tracking and multi-currency invoicing for a tutoring business.
#[derive(Parser, Debug)]
#[command(
    name = "tutoring-service",
    version,
    about = "Tutoring billing REST API",
    long_about = "Records lessons and builds family, teacher and supervisor invoices \
                  on demand in each party's currency.\n\n\
                  Default config: ~/.config/tutoring-billing/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "TUTORING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Use in-memory storage instead of the configured database.
    #[arg(long)]
    in_memory: bool,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip creating the bootstrap super-admin.
    #[arg(long)]
    no_admin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(tutoring_billing::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) if cli.check => {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.in_memory {
        config.database.backend = StorageBackend::Memory;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Storage     : {:?} ({})", config.database.backend, config.database.url);
        println!("   Rates from  : {}", config.currency.provider_url);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
