use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use layover_planner::{LayoverConfig, LayoverPlanner, logging, web};

/// Grace period on top of the planning deadline before the server gives up
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // optional explicit config file as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = LayoverConfig::load_from_path(config_path)
        .context("Failed to load configuration")?;

    logging::init(&config.logging);
    tracing::info!("Starting layover planner v{}", layover_planner::VERSION);

    let planner = LayoverPlanner::from_config(&config)
        .context("Failed to initialise planner")?;
    let request_timeout = config.planner.deadline() + REQUEST_TIMEOUT_MARGIN;

    web::run(Arc::new(planner), &config.server, request_timeout).await
}
