use crate::{Config, ConfigError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "screenshot-server")]
#[command(about = "HTTP service that renders a URL in headless Chrome and returns a PNG")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "PORT", help = "Port to listen on [default: 3000]")]
    pub port: Option<u16>,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Per-request timeout in seconds, also used for navigation")]
    pub timeout: Option<u64>,

    #[arg(long, env = "CHROME_PATH", help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, env = "METRICS_PORT", help = "Expose Prometheus metrics on this port")]
    pub metrics_port: Option<u16>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

/// Build the runtime configuration: file (if any), then CLI/env overrides,
/// then validation.
pub async fn load_config(args: &Cli) -> Result<Config, ConfigError> {
    let mut config = if let Some(config_path) = &args.config {
        let config_content = tokio::fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        Config::default()
    };

    apply_overrides(&mut config, args);
    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Request timeout: {:?}", config.request_timeout);
    info!("Default screen: {}x{}", config.screen.width, config.screen.height);

    Ok(config)
}

pub fn apply_overrides(config: &mut Config, args: &Cli) {
    if let Some(port) = args.port {
        config.port = port;
    }

    if let Some(timeout) = args.timeout {
        config.request_timeout = Duration::from_secs(timeout);
        config.navigation_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    if let Some(metrics_port) = args.metrics_port {
        config.metrics_port = Some(metrics_port);
    }
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
}
