use common::{IndexSelector, JobId, Language, Stage, StageOutput};
use std::{future::Future, sync::Arc};
use tracing::{error, info, warn};

use crate::agents::{StageError, StageUnits};
use crate::store::JobStore;

/// Corre las cuatro etapas de un job en orden, escribiendo en el store
/// después de cada transición.
#[derive(Clone)]
pub struct Orchestrator {
    store: JobStore,
    units: Arc<dyn StageUnits>,
}

impl Orchestrator {
    pub fn new(store: JobStore, units: Arc<dyn StageUnits>) -> Self {
        Self { store, units }
    }

    /// Ejecuta el pipeline completo para `id`. Nunca devuelve error: el
    /// resultado queda escrito en el record.
    pub async fn run(&self, id: JobId) {
        let (index, language) = match self.store.get(&id) {
            Some(rec) => (rec.index, rec.language),
            None => {
                warn!("job {} no existe, no se ejecuta el pipeline", id);
                return;
            }
        };

        info!("iniciando pipeline {} ({} / {})", id, index, language);

        match self.run_stages(&id, index, language).await {
            Ok(()) => {
                self.store.update(&id, |rec| rec.finish());
                info!("job {} completado", id);
            }
            Err(e) => {
                error!("job {} falló: {}", id, e);
            }
        }
    }

    async fn run_stages(
        &self,
        id: &str,
        index: IndexSelector,
        language: Language,
    ) -> Result<(), StageError> {
        let units = self.units.clone();
        let trend = self
            .step(id, Stage::Analysis, async move { units.analyze(index).await })
            .await?;

        let units = self.units.clone();
        let collected = self
            .step(id, Stage::Collection, async move { units.collect(index).await })
            .await?;

        let units = self.units.clone();
        let script = self
            .step(id, Stage::Scripting, async move {
                units
                    .write_script(index, language, &trend, &collected)
                    .await
            })
            .await?;

        let units = self.units.clone();
        self.step(id, Stage::Packaging, async move {
            units.package(index, language, &script).await
        })
        .await?;

        Ok(())
    }

    /// Una transición completa de etapa: running -> completed | failed.
    ///
    /// La unidad corre en su propia tarea; si hace panic el JoinError
    /// se registra como fallo de la etapa y el job queda cerrado igual.
    async fn step<T, F>(&self, id: &str, stage: Stage, unit: F) -> Result<T, StageError>
    where
        T: Into<StageOutput> + Clone + Send + 'static,
        F: Future<Output = Result<T, StageError>> + Send + 'static,
    {
        self.store
            .update(id, |rec| rec.agents.get_mut(stage).start(stage.milestone()));
        info!("job {}: etapa {} en curso", id, stage);

        let result = match tokio::spawn(unit).await {
            Ok(res) => res,
            Err(join_err) => {
                warn!("panic o join error en etapa {} del job {}: {:?}", stage, id, join_err);
                Err(StageError::Panicked { stage })
            }
        };

        match result {
            Ok(out) => {
                let data: StageOutput = out.clone().into();
                self.store
                    .update(id, |rec| rec.agents.get_mut(stage).complete(data));
                info!("job {}: etapa {} completada", id, stage);
                Ok(out)
            }
            Err(e) => {
                let reason = e.to_string();
                self.store.update(id, |rec| rec.fail(stage, reason));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::MockAgents;
    use crate::facts::MarketFacts;
    use async_trait::async_trait;
    use common::{
        CollectedData, JobStatus, Podcast, Script, StageStatus, TrendAnalysis,
    };
    use std::{sync::Mutex, time::Duration};

    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        None,
        Error(Stage),
        Panic(Stage),
    }

    /// Unidades de prueba: delegan en MockAgents, pueden fallar en una
    /// etapa y verifican el estado del store cada vez que se las llama.
    struct TestUnits {
        inner: MockAgents,
        fault: Fault,
        store: JobStore,
        calls: Mutex<Vec<Stage>>,
        violations: Mutex<Vec<String>>,
    }

    impl TestUnits {
        fn new(store: JobStore, fault: Fault) -> Self {
            Self {
                inner: MockAgents::new(Arc::new(MarketFacts::seeded(21)), Duration::from_millis(1)),
                fault,
                store,
                calls: Mutex::new(Vec::new()),
                violations: Mutex::new(Vec::new()),
            }
        }

        fn enter(&self, stage: Stage) -> Result<(), StageError> {
            self.calls.lock().unwrap().push(stage);
            self.check_snapshot(stage);

            match self.fault {
                Fault::Error(s) if s == stage => Err(StageError::Failed {
                    stage,
                    reason: "fuente caída".to_string(),
                }),
                Fault::Panic(s) if s == stage => panic!("unidad {} explotó", stage),
                _ => Ok(()),
            }
        }

        // al entrar a una etapa: las anteriores completas, ésta running
        // con su milestone, las siguientes idle
        fn check_snapshot(&self, stage: Stage) {
            let rec = match self.store.list_recent(1).pop() {
                Some(r) => r,
                None => return,
            };
            let mut v = self.violations.lock().unwrap();
            for (s, st) in rec.agents.iter() {
                let ok = if s.index() < stage.index() {
                    st.status == StageStatus::Completed && st.progress == 100
                } else if s == stage {
                    st.status == StageStatus::Running && st.progress == stage.milestone()
                } else {
                    st.status == StageStatus::Idle && st.progress == 0
                };
                if !ok {
                    v.push(format!("al entrar a {}: {} en {:?}", stage, s, st.status));
                }
            }
        }
    }

    #[async_trait]
    impl StageUnits for TestUnits {
        async fn analyze(&self, index: IndexSelector) -> Result<TrendAnalysis, StageError> {
            self.enter(Stage::Analysis)?;
            self.inner.analyze(index).await
        }

        async fn collect(&self, index: IndexSelector) -> Result<CollectedData, StageError> {
            self.enter(Stage::Collection)?;
            self.inner.collect(index).await
        }

        async fn write_script(
            &self,
            index: IndexSelector,
            language: Language,
            trend: &TrendAnalysis,
            collected: &CollectedData,
        ) -> Result<Script, StageError> {
            self.enter(Stage::Scripting)?;
            self.inner.write_script(index, language, trend, collected).await
        }

        async fn package(
            &self,
            index: IndexSelector,
            language: Language,
            script: &Script,
        ) -> Result<Podcast, StageError> {
            self.enter(Stage::Packaging)?;
            self.inner.package(index, language, script).await
        }
    }

    async fn run_with(fault: Fault) -> (JobStore, Arc<TestUnits>, JobId) {
        let store = JobStore::new();
        let units = Arc::new(TestUnits::new(store.clone(), fault));
        let orch = Orchestrator::new(store.clone(), units.clone());

        let id = store.create(IndexSelector::Nifty50, Language::English);
        orch.run(id.clone()).await;
        (store, units, id)
    }

    #[tokio::test]
    async fn camino_feliz_completa_las_cuatro_etapas_en_orden() {
        let (store, units, id) = run_with(Fault::None).await;

        assert_eq!(*units.calls.lock().unwrap(), Stage::ALL.to_vec());
        assert!(units.violations.lock().unwrap().is_empty(), "{:?}", units.violations);

        let rec = store.get(&id).unwrap();
        assert_eq!(rec.status, JobStatus::Completed);
        assert!(rec.completed_at.is_some());
        assert!(rec.error.is_none());
        for (_, st) in rec.agents.iter() {
            assert_eq!(st.status, StageStatus::Completed);
            assert_eq!(st.progress, 100);
            assert!(st.data.is_some());
        }
        assert!(matches!(rec.agents.analysis.data, Some(StageOutput::Analysis(_))));
        assert!(matches!(rec.agents.collection.data, Some(StageOutput::Collection(_))));
        assert!(matches!(rec.agents.scripting.data, Some(StageOutput::Script(_))));
        assert!(matches!(rec.agents.packaging.data, Some(StageOutput::Podcast(_))));
    }

    #[tokio::test]
    async fn error_en_una_etapa_aborta_el_resto() {
        let (store, units, id) = run_with(Fault::Error(Stage::Collection)).await;

        assert_eq!(
            *units.calls.lock().unwrap(),
            vec![Stage::Analysis, Stage::Collection]
        );

        let rec = store.get(&id).unwrap();
        assert_eq!(rec.status, JobStatus::Failed);
        assert!(rec.completed_at.is_some());
        assert_eq!(
            rec.error.as_deref(),
            Some("stage collection failed: fuente caída")
        );
        assert_eq!(rec.agents.analysis.status, StageStatus::Completed);
        assert_eq!(rec.agents.collection.status, StageStatus::Failed);
        assert!(rec.agents.collection.data.is_none());
        for st in [&rec.agents.scripting, &rec.agents.packaging] {
            assert_eq!(st.status, StageStatus::Idle);
            assert_eq!(st.progress, 0);
            assert!(st.data.is_none());
        }
    }

    #[tokio::test]
    async fn panic_en_una_etapa_cierra_el_job_como_failed() {
        let (store, _units, id) = run_with(Fault::Panic(Stage::Scripting)).await;

        let rec = store.get(&id).unwrap();
        assert_eq!(rec.status, JobStatus::Failed);
        assert!(rec.completed_at.is_some());
        assert_eq!(rec.error.as_deref(), Some("stage scripting panicked"));
        assert_eq!(rec.agents.collection.status, StageStatus::Completed);
        assert_eq!(rec.agents.scripting.status, StageStatus::Failed);
        assert_eq!(rec.agents.packaging.status, StageStatus::Idle);
        assert_eq!(rec.agents.packaging.progress, 0);
    }

    #[tokio::test]
    async fn falla_en_la_ultima_etapa_conserva_las_anteriores() {
        let (store, _units, id) = run_with(Fault::Error(Stage::Packaging)).await;

        let rec = store.get(&id).unwrap();
        assert_eq!(rec.status, JobStatus::Failed);
        assert_eq!(rec.agents.scripting.status, StageStatus::Completed);
        assert!(rec.agents.scripting.data.is_some());
        assert_eq!(rec.agents.packaging.status, StageStatus::Failed);
        assert_eq!(rec.agents.packaging.progress, 90);
    }

    #[tokio::test]
    async fn run_de_job_inexistente_no_toca_el_store() {
        let store = JobStore::new();
        let units = Arc::new(TestUnits::new(store.clone(), Fault::None));
        let orch = Orchestrator::new(store.clone(), units.clone());

        orch.run("does-not-exist".to_string()).await;

        assert!(store.is_empty());
        assert!(units.calls.lock().unwrap().is_empty());
    }
}
