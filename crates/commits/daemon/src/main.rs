//! commitsd - publish commitments through URLs
//!
//! The daemon provides:
//! - JSON endpoints to create, look up, complete and delete commitments
//! - deadline parsing of `user.promises.to/<expression>` addresses
//! - credit scoring and per-user standings

use anyhow::Context;
use clap::Parser;
use commitsd::{DaemonConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// commitsd CLI
#[derive(Parser)]
#[command(name = "commitsd")]
#[command(about = "commitsd - promises.to / commits.to daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COMMITS_CONFIG")]
    config: Option<String>,

    /// Listen address, overriding the configuration
    #[arg(short, long, env = "COMMITS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overriding the configuration
    #[arg(long, env = "COMMITS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "COMMITS_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .with_context(|| format!("invalid listen address '{listen}'"))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        utc_offset_minutes = config.parser.utc_offset_minutes,
        "starting commitsd"
    );

    let server = Server::new(config).await.context("starting server")?;
    server.run().await.context("running server")
}
