#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Backend entry-point: loads settings, opens the Record Store and serves
//! the inspection API.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use inspection_backend::domain::SessionSweeper;
use inspection_backend::inbound::http::health::HealthState;
use inspection_backend::inbound::http::state::HttpState;
use inspection_backend::server::{
    InspectionSettings, ServerConfig, build_record_store, create_server, load_housing_types,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = InspectionSettings::load()
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let bind_addr = settings.bind_addr()?;
    let session_config = settings.session_config()?;
    let store = build_record_store(&settings)
        .await
        .wrap_err("failed to open record store")?;
    let housing_types = load_housing_types(&settings)?;

    let http_state = HttpState::new(
        store,
        Arc::new(DefaultClock),
        Arc::new(housing_types),
        session_config,
    );
    let sweeper = SessionSweeper::spawn(
        Arc::clone(&http_state.sessions),
        session_config.sweep_interval,
    );

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr, http_state),
    )
    .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "inspection service listening");

    let outcome = server.await;
    health_state.mark_unhealthy();
    sweeper.shutdown().await;
    outcome.wrap_err("server terminated abnormally")
}
