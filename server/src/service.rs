use chrono::Utc;
use common::{IndexSelector, JobId, JobRecord, Language, MarketOverview, SelectorError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::agents::StageUnits;
use crate::facts::MarketFacts;
use crate::pipeline::Orchestrator;
use crate::store::JobStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] SelectorError),
    #[error("analysis {0} not found")]
    NotFound(JobId),
}

/// Frontera del sistema: valida pedidos, crea jobs, lanza el
/// orquestador en segundo plano y responde consultas leyendo el store.
#[derive(Clone)]
pub struct JobService {
    store: JobStore,
    orchestrator: Orchestrator,
    facts: Arc<MarketFacts>,
}

impl JobService {
    pub fn new(store: JobStore, units: Arc<dyn StageUnits>, facts: Arc<MarketFacts>) -> Self {
        let orchestrator = Orchestrator::new(store.clone(), units);
        Self {
            store,
            orchestrator,
            facts,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Valida índice e idioma (default English), crea el job y deja el
    /// pipeline corriendo en una tarea aparte. Vuelve enseguida con el id.
    ///
    /// Debe llamarse dentro de un runtime de tokio.
    pub fn submit(&self, index: &str, language: Option<&str>) -> Result<JobId, ServiceError> {
        let index: IndexSelector = index.parse()?;
        let language: Language = match language {
            Some(l) => l.parse()?,
            None => Language::default(),
        };

        let id = self.store.create(index, language);
        info!(
            "analysis {} creado para {} en {} ({} jobs en memoria)",
            id,
            index,
            language,
            self.store.len()
        );

        let orchestrator = self.orchestrator.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            orchestrator.run(job_id).await;
        });

        Ok(id)
    }

    pub fn status(&self, id: &str) -> Result<JobRecord, ServiceError> {
        self.store
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub fn recent(&self, n: usize) -> Vec<JobRecord> {
        self.store.list_recent(n)
    }

    pub fn market_overview(&self) -> MarketOverview {
        let indices = IndexSelector::OVERVIEW
            .into_iter()
            .map(|idx| (idx, self.facts.quote(idx)))
            .collect();

        MarketOverview {
            market_status: "Open".to_string(),
            indices,
            timestamp: Utc::now(),
        }
    }
}
