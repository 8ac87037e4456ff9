//! Reverse-proxy load balancer.
//!
//! ```text
//!     Client ──▶ rate limiter ──▶ sticky session ──▶ strategy ──▶ Backend
//!                                       │                │
//!                                       └── pool (health, load) ◀── health monitor
//! ```

use clap::Parser;
use std::path::PathBuf;

use reverse_balancer::config::load_config;
use reverse_balancer::lifecycle::startup;
use reverse_balancer::observability::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "reverse-balancer", version, about = "HTTP reverse-proxy load balancer")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config);
    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|v| v.config.observability.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);

    tracing::info!("reverse-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    let validated = match loaded {
        Ok(validated) => validated,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    startup::run(validated).await?;
    Ok(())
}
