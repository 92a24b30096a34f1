mod app;
mod core;
mod effects;
mod events;
mod models;
mod utils;

use crate::{
    app::{config, runner::Runner, state::AppState},
    core::{
        helix::TauApiClient,
        matrix::{MatrixClient, MatrixWriter},
        obs::ObsClient,
        tau::{self, TauClient},
    },
};
use eyre::{Context, eyre};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    // Setup file-based logging
    let file_appender = tracing_appender::rolling::never(".", "pointfx.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .init();

    let config = config::load().await?;
    let token = config
        .tau
        .token
        .clone()
        .ok_or_else(|| eyre!("tau.token is not set (try POINTFX_TAU__TOKEN)"))?;

    let (event_tx, event_rx) = mpsc::channel(100);

    let (obs, obs_handle) = ObsClient::new(
        config.obs.host.clone(),
        config.obs.port,
        config.obs.password.clone(),
        event_tx.clone(),
    );
    tokio::spawn(obs.run());

    let tau_url = tau::events_url(&config.tau.domain, config.tau.port)?;
    tokio::spawn(TauClient::new(tau_url, token.clone(), event_tx.clone()).run());

    let users = TauApiClient::new(&config.tau.domain, token)?;
    let matrix = config
        .matrix
        .url
        .clone()
        .map(MatrixClient::new)
        .transpose()
        .context("Failed to build matrix client")?;
    let (matrix_tx, matrix_rx) = mpsc::channel(32);
    tokio::spawn(MatrixWriter::new(users, matrix).run(matrix_rx));

    let runner = Runner::new(
        AppState::new(),
        config,
        Arc::new(obs_handle),
        event_tx,
        event_rx,
        matrix_tx,
    );

    tokio::select! {
        _ = runner.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
