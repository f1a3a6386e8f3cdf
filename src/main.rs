// main.rs
// Loads settings, sets up tracing and MongoDB state, then serves the JSON API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use fieldsales::{build_router, config::Settings, state, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    telemetry::init_tracing(&settings.log_level, settings.log_json);

    let state = Arc::new(
        state::init_state(&settings)
            .await
            .context("failed to initialize MongoDB state")?,
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
