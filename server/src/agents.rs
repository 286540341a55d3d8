use async_trait::async_trait;
use common::{CollectedData, IndexSelector, Language, Podcast, Script, Stage, TrendAnalysis};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::config::clamp_delay;
use crate::facts::MarketFacts;

#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("stage {stage} failed: {reason}")]
    Failed { stage: Stage, reason: String },
    #[error("stage {stage} panicked")]
    Panicked { stage: Stage },
}

/// Las cuatro unidades de trabajo del pipeline. Cada una recibe como
/// argumentos tipados las salidas de las etapas que necesita.
#[async_trait]
pub trait StageUnits: Send + Sync {
    async fn analyze(&self, index: IndexSelector) -> Result<TrendAnalysis, StageError>;

    async fn collect(&self, index: IndexSelector) -> Result<CollectedData, StageError>;

    async fn write_script(
        &self,
        index: IndexSelector,
        language: Language,
        trend: &TrendAnalysis,
        collected: &CollectedData,
    ) -> Result<Script, StageError>;

    async fn package(
        &self,
        index: IndexSelector,
        language: Language,
        script: &Script,
    ) -> Result<Podcast, StageError>;
}

/// Implementación de producción: espera `delay` (simula la llamada lenta
/// a un servicio externo) y genera datos con `MarketFacts`.
pub struct MockAgents {
    facts: Arc<MarketFacts>,
    delay: Duration,
}

impl MockAgents {
    pub fn new(facts: Arc<MarketFacts>, delay: Duration) -> Self {
        Self {
            facts,
            delay: clamp_delay(delay),
        }
    }

    async fn simulate_latency(&self, stage: Stage) {
        debug!("etapa {}: simulando latencia de {:?}", stage, self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

#[async_trait]
impl StageUnits for MockAgents {
    async fn analyze(&self, index: IndexSelector) -> Result<TrendAnalysis, StageError> {
        self.simulate_latency(Stage::Analysis).await;
        Ok(self.facts.trend(index))
    }

    async fn collect(&self, _index: IndexSelector) -> Result<CollectedData, StageError> {
        self.simulate_latency(Stage::Collection).await;
        Ok(self.facts.collection())
    }

    async fn write_script(
        &self,
        index: IndexSelector,
        language: Language,
        trend: &TrendAnalysis,
        collected: &CollectedData,
    ) -> Result<Script, StageError> {
        self.simulate_latency(Stage::Scripting).await;
        Ok(self.facts.script(index, language, trend, collected))
    }

    async fn package(
        &self,
        _index: IndexSelector,
        language: Language,
        script: &Script,
    ) -> Result<Podcast, StageError> {
        self.simulate_latency(Stage::Packaging).await;
        Ok(self.facts.podcast(language, script))
    }
}
