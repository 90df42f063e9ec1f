//! Dealflow server: local deal store plus the reconciled webhook pipeline.
//!
//! Usage: `dealflow` (config from ~/.dealflow/config.json or `$DEALFLOW_CONFIG`).
//! Log level follows `RUST_LOG`, default `info`.

use anyhow::Context;
use tokio::net::TcpListener;

use dealflow_lib::api;
use dealflow_lib::state::{config_path, load_config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("loading config ({})", config_path().unwrap_or_default().display()))?;
    let bind_addr = config.bind_addr.clone();
    log::info!(
        "Vocabulary {}, seed data {}",
        config
            .vocabulary_path
            .as_deref()
            .unwrap_or(&config.vocabulary_version),
        if config.seed_sample_data { "on" } else { "off" }
    );

    let state = AppState::from_config(config).map_err(anyhow::Error::msg)?;
    let app = api::router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    log::info!("Dealflow listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
