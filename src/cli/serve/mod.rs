//! Serve command - runs the MCP server on stdio

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use super::Overrides;
use crate::config::AppConfig;
use crate::infrastructure::aws::has_explicit_credentials;
use crate::infrastructure::logging;

/// Run the MCP server until the client disconnects or Ctrl+C
pub async fn run(overrides: Overrides) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    apply_overrides(&mut config, overrides);
    logging::init_logging(&config.logging);

    if !has_explicit_credentials(|name| std::env::var(name).ok()) {
        warn!(
            "Neither AWS_PROFILE nor AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY is set; \
             falling back to the default credential chain"
        );
    }

    info!(
        region = %config.aws.region,
        profile = ?config.aws.profile,
        locale = ?config.errors.locale,
        "Starting Bedrock knowledge base MCP server"
    );

    let server = crate::build_server(&config).await;

    tokio::select! {
        result = server.serve_stdio() => result?,
        _ = shutdown_signal() => {}
    }

    info!("MCP server shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) {
    if let Some(region) = overrides.region.filter(|r| !r.trim().is_empty()) {
        config.aws.region = region.trim().to_string();
    }

    if let Some(level) = overrides.log_level {
        config.logging.level = level;
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }

    info!("Received Ctrl+C, shutting down");
}
