// server/src/store.rs

use chrono::Utc;
use common::{IndexSelector, JobId, JobRecord, Language};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::warn;

struct Entry {
    // orden de inserción, para desempatar started_at
    seq: u64,
    record: JobRecord,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Entry>,
    next_seq: u64,
}

/// Tabla de jobs en memoria. Se clona barato (es un `Arc`) y se
/// comparte entre el servicio, los orquestadores y los handlers.
///
/// Cada operación toma el lock una sola vez, así una transición de
/// etapa se ve completa o no se ve.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<Inner>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // si algún escritor hizo panic con el lock tomado seguimos igual:
        // las mutaciones son pequeñas y no dejan el record a medias
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Crea un job nuevo en estado running con las cuatro etapas idle.
    pub fn create(&self, index: IndexSelector, language: Language) -> JobId {
        let id = new_job_id();
        let record = JobRecord::new(id.clone(), index, language);

        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(id.clone(), Entry { seq, record });

        id
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.lock().jobs.get(id).map(|e| e.record.clone())
    }

    /// Aplica `mutator` al record bajo el lock. Devuelve false si el id
    /// no existe (no debería pasar: sólo el orquestador actualiza, y sólo
    /// sus propios jobs).
    pub fn update<F>(&self, id: &str, mutator: F) -> bool
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut inner = self.lock();
        match inner.jobs.get_mut(id) {
            Some(entry) => {
                mutator(&mut entry.record);
                true
            }
            None => {
                warn!("update sobre job inexistente {}, se ignora", id);
                false
            }
        }
    }

    /// Hasta `n` jobs, del más nuevo al más viejo por started_at. Si
    /// empatan se respeta el orden de inserción.
    pub fn list_recent(&self, n: usize) -> Vec<JobRecord> {
        let inner = self.lock();
        let mut entries: Vec<&Entry> = inner.jobs.values().collect();
        entries.sort_by(|a, b| {
            b.record
                .started_at
                .cmp(&a.record.started_at)
                .then(a.seq.cmp(&b.seq))
        });
        entries
            .into_iter()
            .take(n)
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn new_job_id() -> JobId {
    format!(
        "analysis_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{JobStatus, StageStatus};
    use std::collections::HashSet;

    #[test]
    fn create_inserta_job_running_con_etapas_idle() {
        let store = JobStore::new();
        let id = store.create(IndexSelector::Nifty50, Language::English);

        assert!(id.starts_with("analysis_"));
        let rec = store.get(&id).unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.status, JobStatus::Running);
        assert_eq!(rec.index, IndexSelector::Nifty50);
        assert!(rec
            .agents
            .iter()
            .all(|(_, st)| st.status == StageStatus::Idle && st.progress == 0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_de_id_desconocido_es_none() {
        let store = JobStore::new();
        assert!(store.get("does-not-exist").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn update_de_id_desconocido_no_hace_nada() {
        let store = JobStore::new();
        let mut called = false;
        let ok = store.update("nope", |_| called = true);
        assert!(!ok);
        assert!(!called);
        assert!(store.is_empty());
    }

    #[test]
    fn update_modifica_en_el_lugar() {
        let store = JobStore::new();
        let id = store.create(IndexSelector::Sensex, Language::Hindi);

        assert!(store.update(&id, |rec| rec.agents.analysis.start(25)));

        let rec = store.get(&id).unwrap();
        assert_eq!(rec.agents.analysis.status, StageStatus::Running);
        assert_eq!(rec.agents.analysis.progress, 25);
    }

    #[test]
    fn list_recent_ordena_desc_y_respeta_limite() {
        let store = JobStore::new();
        let base = Utc::now();
        let mut ids = Vec::new();
        for i in 0..5 {
            let id = store.create(IndexSelector::NiftyIt, Language::English);
            // started_at explícitos para no depender del reloj
            store.update(&id, |rec| rec.started_at = base + Duration::seconds(i));
            ids.push(id);
        }

        let recent = store.list_recent(3);
        let got: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(got, vec![ids[4].as_str(), ids[3].as_str(), ids[2].as_str()]);

        // con menos jobs que n devuelve todos
        assert_eq!(store.list_recent(10).len(), 5);
        assert!(store.list_recent(0).is_empty());
    }

    #[test]
    fn list_recent_desempata_por_orden_de_insercion() {
        let store = JobStore::new();
        let ts = Utc::now();
        let a = store.create(IndexSelector::NiftyAuto, Language::English);
        let b = store.create(IndexSelector::NiftyAuto, Language::English);
        store.update(&a, |rec| rec.started_at = ts);
        store.update(&b, |rec| rec.started_at = ts);

        let c = store.create(IndexSelector::NiftyAuto, Language::English);
        store.update(&c, |rec| rec.started_at = ts + Duration::seconds(1));

        let got: Vec<String> = store.list_recent(3).into_iter().map(|r| r.id).collect();
        assert_eq!(got, vec![c, a, b]);
    }

    #[test]
    fn ids_son_unicos_con_creaciones_concurrentes() {
        let store = JobStore::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.create(IndexSelector::NiftyBank, Language::English))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                all.insert(id);
            }
        }
        assert_eq!(all.len(), 200);
        assert_eq!(store.len(), 200);
    }
}
