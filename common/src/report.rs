use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::{IndexSelector, Language};

/* --------- Cotización de un índice --------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "MACD")]
    pub macd: String,
    #[serde(rename = "Support")]
    pub support: f64,
    #[serde(rename = "Resistance")]
    pub resistance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub symbol: IndexSelector,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub indicators: Indicators,
}

/* --------- Etapa 1: análisis de tendencia --------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub trend: String,
    pub momentum: String,
    pub volatility: String,
    pub key_levels: KeyLevels,
}

/// Salida de la etapa de análisis: la cotización completa más el resumen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    #[serde(flatten)]
    pub quote: IndexQuote,
    pub analysis: TrendSummary,
}

/* --------- Etapa 2: recolección de datos --------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub name: String,
    pub performance: String,
    pub outlook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicData {
    pub repo_rate: String,
    pub inflation: String,
    pub gdp_growth: String,
    pub fiscal_deficit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedData {
    pub sources: Vec<String>,
    pub sectors: Vec<SectorPerformance>,
    pub economic_data: EconomicData,
    pub timestamp: DateTime<Utc>,
}

/* --------- Etapa 3: guion --------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub intro: String,
    pub analysis: String,
    pub sectors: String,
    pub outlook: String,
    pub word_count: u32,
    pub language: Language,
    pub duration_estimate: String,
    pub timestamp: DateTime<Utc>,
}

/* --------- Etapa 4: podcast --------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub title: String,
    pub audio_url: String,
    pub duration: String,
    pub file_size: String,
    pub format: String,
    pub quality: String,
    pub voice: String,
    pub timestamp: DateTime<Utc>,
}

/// Lo que queda guardado en `StageState::data`.
///
/// Se serializa sin tag: el JSON de cada etapa es exactamente su payload.
/// El orden de las variantes importa al deserializar (del más específico
/// al más genérico).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageOutput {
    Analysis(TrendAnalysis),
    Collection(CollectedData),
    Script(Script),
    Podcast(Podcast),
}

impl From<TrendAnalysis> for StageOutput {
    fn from(v: TrendAnalysis) -> Self {
        StageOutput::Analysis(v)
    }
}

impl From<CollectedData> for StageOutput {
    fn from(v: CollectedData) -> Self {
        StageOutput::Collection(v)
    }
}

impl From<Script> for StageOutput {
    fn from(v: Script) -> Self {
        StageOutput::Script(v)
    }
}

impl From<Podcast> for StageOutput {
    fn from(v: Podcast) -> Self {
        StageOutput::Podcast(v)
    }
}
