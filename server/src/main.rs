mod agents;
mod config;
mod facts;
mod handlers;
mod pipeline;
mod service;
mod state;
mod store;

use crate::agents::MockAgents;
use crate::config::Config;
use crate::facts::MarketFacts;
use crate::service::JobService;
use crate::state::AppState;
use crate::store::JobStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trendcast_server=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // datos reproducibles si viene TRENDCAST_SEED
    let facts = Arc::new(match config.seed {
        Some(seed) => MarketFacts::seeded(seed),
        None => MarketFacts::from_entropy(),
    });
    let units = Arc::new(MockAgents::new(facts.clone(), config.stage_delay));
    let service = JobService::new(JobStore::new(), units, facts);

    let app = handlers::build_router(AppState::new(service, config.recent_limit));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind_addr))?;
    info!(
        "trendcast escuchando en {} (latencia por etapa {:?})",
        listener.local_addr()?,
        config.stage_delay
    );

    axum::serve(listener, app).await?;
    Ok(())
}
