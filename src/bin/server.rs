//! Dispatch core server: wires the Postgres store, routing client,
//! managers and the auto-close scheduler, then serves the API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use dispatch_core::config::DispatchConfig;
use dispatch_core::events::EventPublisher;
use dispatch_core::logging::init_logging;
use dispatch_core::orchestration::{
    AssignmentManager, AutoCloseScheduler, SessionLifecycleManager,
};
use dispatch_core::routing::HttpRouteMatrixClient;
use dispatch_core::solver::AutoAssignmentEngine;
use dispatch_core::storage::{DispatchStore, PgStore};
use dispatch_core::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Arc::new(DispatchConfig::from_env().context("loading configuration")?);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("connecting to postgres")?;

    let store: Arc<dyn DispatchStore> = Arc::new(PgStore::new(pool));
    let publisher = EventPublisher::new(config.event_buffer_size);

    let routing_client = HttpRouteMatrixClient::new(
        config.routing.endpoint.clone(),
        Duration::from_millis(config.routing.timeout_ms),
    )
    .context("building route matrix client")?;
    let engine = AutoAssignmentEngine::new(Arc::new(routing_client));

    let assignments = Arc::new(AssignmentManager::new(
        store.clone(),
        engine,
        publisher.clone(),
    ));
    let sessions = Arc::new(SessionLifecycleManager::new(
        store.clone(),
        publisher.clone(),
    ));

    let scheduler = AutoCloseScheduler::new(
        store.clone(),
        sessions.clone(),
        config.shift.clone(),
    );
    tokio::spawn(scheduler.run());

    let state = AppState::new(assignments, sessions, store, config.clone());
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(address = %config.bind_address, "dispatch core listening");

    axum::serve(listener, app).await.context("serving API")?;
    Ok(())
}
