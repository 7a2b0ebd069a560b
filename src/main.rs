use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_logo_sync::{
    batch::BatchDriver,
    config::{CollectionConfig, Config},
    logo_sync::LogoSyncPipeline,
    utils::RetryingHttpClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "epg-logo-sync")]
#[command(version)]
#[command(about = "Localizes the logo images referenced by EPG schedule files")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Schedule collection directory (repeatable, replaces the configured ones)
    #[arg(long = "collection", value_name = "DIR")]
    collections: Vec<PathBuf>,

    /// Artifact output root (overrides config file)
    #[arg(short, long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Public URL prefix for rewritten logos (overrides config file)
    #[arg(short, long, value_name = "URL")]
    public_prefix: Option<String>,

    /// Concurrent downloads per schedule file (overrides config file)
    #[arg(short = 'w', long, value_name = "N")]
    max_workers: Option<usize>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_logging(cli: &Cli) {
    let log_filter = format!("epg_logo_sync={}", cli.log_level);
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()),
    );

    match cli.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    info!("Starting EPG logo sync v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if !cli.collections.is_empty() {
        config.collections = cli
            .collections
            .iter()
            .map(|path| CollectionConfig {
                path: path.clone(),
                day: None,
            })
            .collect();
    }
    if let Some(output_root) = cli.output_root {
        config.storage.output_root = output_root;
    }
    if let Some(public_prefix) = cli.public_prefix {
        config.storage.public_prefix = public_prefix;
    }
    if let Some(max_workers) = cli.max_workers {
        config.fetch.max_workers = max_workers;
    }
    config.validate()?;

    info!(
        "Writing artifacts to {} (public prefix {})",
        config.storage.output_root.display(),
        config.storage.public_prefix
    );

    let client = Arc::new(RetryingHttpClient::new(&config.fetch)?);
    let pipeline = LogoSyncPipeline::new(&config, client);
    let driver = BatchDriver::new(pipeline, config.collections.clone());

    let report = driver.run().await;
    report.log_summary();
    info!("All done.");

    Ok(())
}
