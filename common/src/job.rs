use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market::{IndexSelector, Language};
use crate::report::StageOutput;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Las cuatro etapas del pipeline, en orden de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Analysis,
    Collection,
    Scripting,
    Packaging,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Analysis,
        Stage::Collection,
        Stage::Scripting,
        Stage::Packaging,
    ];

    pub fn index(&self) -> usize {
        match self {
            Stage::Analysis => 0,
            Stage::Collection => 1,
            Stage::Scripting => 2,
            Stage::Packaging => 3,
        }
    }

    /// Progreso que se publica cuando la etapa arranca.
    /// Crece estrictamente de una etapa a la siguiente.
    pub fn milestone(&self) -> u8 {
        match self {
            Stage::Analysis => 25,
            Stage::Collection => 50,
            Stage::Scripting => 75,
            Stage::Packaging => 90,
        }
    }

    /// Clave con la que aparece la etapa dentro de `agents` en el JSON.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Stage::Analysis => "trendAnalyzer",
            Stage::Collection => "dataCollector",
            Stage::Scripting => "scriptWriter",
            Stage::Packaging => "podcaster",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Analysis => "analysis",
            Stage::Collection => "collection",
            Stage::Scripting => "scripting",
            Stage::Packaging => "packaging",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageState {
    pub status: StageStatus,
    pub data: Option<StageOutput>,
    pub progress: u8,
}

impl StageState {
    pub fn start(&mut self, milestone: u8) {
        self.status = StageStatus::Running;
        self.progress = self.progress.max(milestone);
    }

    pub fn complete(&mut self, data: StageOutput) {
        self.status = StageStatus::Completed;
        self.data = Some(data);
        self.progress = 100;
    }

    pub fn fail(&mut self) {
        self.status = StageStatus::Failed;
        self.data = None;
    }
}

/// Estado de las cuatro etapas. Es un struct (y no un mapa) para que
/// las cuatro existan siempre y el orden del JSON sea el de ejecución.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentStages {
    #[serde(rename = "trendAnalyzer")]
    pub analysis: StageState,
    #[serde(rename = "dataCollector")]
    pub collection: StageState,
    #[serde(rename = "scriptWriter")]
    pub scripting: StageState,
    #[serde(rename = "podcaster")]
    pub packaging: StageState,
}

impl AgentStages {
    pub fn get(&self, stage: Stage) -> &StageState {
        match stage {
            Stage::Analysis => &self.analysis,
            Stage::Collection => &self.collection,
            Stage::Scripting => &self.scripting,
            Stage::Packaging => &self.packaging,
        }
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut StageState {
        match stage {
            Stage::Analysis => &mut self.analysis,
            Stage::Collection => &mut self.collection,
            Stage::Scripting => &mut self.scripting,
            Stage::Packaging => &mut self.packaging,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageState)> {
        Stage::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "analysis_id")]
    pub id: JobId,
    pub status: JobStatus,
    pub index: IndexSelector,
    pub language: Language,
    pub agents: AgentStages,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(id: JobId, index: IndexSelector, language: Language) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            index,
            language,
            agents: AgentStages::default(),
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Cierra el job como completado. No hace nada si ya estaba cerrado.
    pub fn finish(&mut self) {
        if self.is_finished() {
            return;
        }
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Marca la etapa y el job como fallidos. No hace nada si ya estaba cerrado.
    pub fn fail(&mut self, stage: Stage, error: String) {
        if self.is_finished() {
            return;
        }
        self.agents.get_mut(stage).fail();
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
    }

    /// Progreso global estimado (0-100), útil para clientes.
    pub fn overall_progress(&self) -> u8 {
        let total: u32 = self.agents.iter().map(|(_, st)| st.progress as u32).sum();
        (total / Stage::ALL.len() as u32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Podcast, StageOutput};

    fn podcast() -> StageOutput {
        StageOutput::Podcast(Podcast {
            title: "t".to_string(),
            audio_url: "/static/audio/x.mp3".to_string(),
            duration: "3:45".to_string(),
            file_size: "2.8 MB".to_string(),
            format: "MP3".to_string(),
            quality: "128kbps".to_string(),
            voice: "Hindi Female".to_string(),
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn record_nuevo_tiene_todas_las_etapas_idle() {
        let rec = JobRecord::new("a1".into(), IndexSelector::Nifty50, Language::English);
        assert_eq!(rec.status, JobStatus::Running);
        assert!(rec.completed_at.is_none());
        for (_, st) in rec.agents.iter() {
            assert_eq!(st.status, StageStatus::Idle);
            assert_eq!(st.progress, 0);
            assert!(st.data.is_none());
        }
    }

    #[test]
    fn milestones_crecen_estrictamente() {
        let ms: Vec<u8> = Stage::ALL.iter().map(|s| s.milestone()).collect();
        assert!(ms.windows(2).all(|w| w[0] < w[1]));
        assert!(ms.iter().all(|m| *m < 100));
    }

    #[test]
    fn fail_es_terminal_y_no_se_revierte() {
        let mut rec = JobRecord::new("a1".into(), IndexSelector::Sensex, Language::Hindi);
        rec.agents.get_mut(Stage::Collection).start(50);
        rec.fail(Stage::Collection, "boom".to_string());

        let done_at = rec.completed_at;
        assert_eq!(rec.status, JobStatus::Failed);
        assert!(done_at.is_some());

        // ni finish ni un segundo fail pisan el cierre
        rec.finish();
        rec.fail(Stage::Scripting, "otro".to_string());
        assert_eq!(rec.status, JobStatus::Failed);
        assert_eq!(rec.completed_at, done_at);
        assert_eq!(rec.error.as_deref(), Some("boom"));
        assert_eq!(rec.agents.scripting.status, StageStatus::Idle);
    }

    #[test]
    fn json_usa_las_claves_de_agents() {
        let mut rec = JobRecord::new("a1".into(), IndexSelector::NiftyIt, Language::Hinglish);
        rec.agents.packaging.complete(podcast());

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["analysis_id"], "a1");
        assert_eq!(v["status"], "running");
        assert_eq!(v["index"], "NIFTY IT");
        assert_eq!(v["agents"]["trendAnalyzer"]["status"], "idle");
        assert_eq!(v["agents"]["podcaster"]["progress"], 100);
        assert_eq!(v["agents"]["podcaster"]["data"]["format"], "MP3");
        assert!(v["completed_at"].is_null());
        // error sólo aparece cuando hay fallo
        assert!(v.get("error").is_none());

        let back: JobRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn overall_progress_promedia_etapas() {
        let mut rec = JobRecord::new("a1".into(), IndexSelector::Nifty50, Language::English);
        assert_eq!(rec.overall_progress(), 0);
        rec.agents.analysis.complete(podcast());
        rec.agents.collection.start(50);
        assert_eq!(rec.overall_progress(), 37);
    }
}
