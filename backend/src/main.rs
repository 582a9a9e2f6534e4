//! API entry-point: loads configuration, migrates the schema, bootstraps the
//! first administrator, and serves the REST API until SIGINT or SIGTERM.

mod server;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use tracing::{info, info_span};

use whenworks::config::ApiConfig;
use whenworks::inbound::http::health::HealthState;
use whenworks::outbound::persistence::{DbPool, migrate};
use whenworks::telemetry;

use server::{bootstrap_admin, build_components, create_server, shutdown_on_signal};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = ApiConfig::load()?;
    telemetry::init(config.app.is_production())
        .map_err(|err| color_eyre::eyre::eyre!("tracing init failed: {err}"))?;
    let span = info_span!("whenworks", component = "api");

    let pool_config = config.database.pool_config()?;
    migrate(&pool_config.database_url)
        .await
        .wrap_err("database migrations failed")?;
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("database pool could not be created")?;

    let components = build_components(&config, pool, &span)?;
    bootstrap_admin(&components, &config, &span).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), components, &config.server, &span)?;
    actix_web::rt::spawn(shutdown_on_signal(server.handle(), health_state, span.clone()));

    let (host, port) = config.server.bind_addr();
    span.in_scope(|| info!(%host, port, environment = config.app.environment(), "listening"));
    server.await?;
    span.in_scope(|| info!("server stopped"));
    Ok(())
}
