//! PDP Sync - headless flow synchronization runner
//!
//! `pdpsync` runs the scheduler until Ctrl-C. `pdpsync once` runs a single
//! pass over every provider and exits non-zero when one of them aborted.

use std::process::ExitCode;

use anyhow::Context;
use pdpsync_app::AppContext;
use pdpsync_domain::SyncStatus;
use pdpsync_infra::{config, init_tracing, LogFormat};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env before tracing so RUST_LOG and PDPSYNC_LOG_JSON apply
    let dotenv = dotenvy::dotenv();

    init_tracing(LogFormat::from_env()).context("failed to initialise tracing")?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => warn!(error = %err, "Could not load .env file"),
    }

    let config = config::load().context("failed to load configuration")?;
    let mut ctx = AppContext::new(config).context("failed to initialise application context")?;

    for (provider, reachable) in ctx.health_check().await.context("health check failed")? {
        info!(%provider, reachable, "Provider health");
    }

    let once = std::env::args().nth(1).is_some_and(|arg| arg == "once");
    let reports = ctx.sync_once().await;
    for report in &reports {
        info!(provider = %report.provider, res = report.res(), summary = %report.summary(), "Initial synchronization");
        for suggestion in &report.suggestions {
            warn!(provider = %report.provider, %suggestion, "Suggestion");
        }
    }
    if once {
        let aborted = reports.iter().any(|report| report.status == SyncStatus::Aborted);
        return Ok(if aborted { ExitCode::FAILURE } else { ExitCode::SUCCESS });
    }

    ctx.start().await.context("failed to start scheduler")?;
    info!("PDP Sync running, press Ctrl-C to stop");

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl-C");
    }

    ctx.shutdown().await.context("failed to stop scheduler")?;
    Ok(ExitCode::SUCCESS)
}
