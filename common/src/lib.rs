pub mod api;
pub mod job;
pub mod market;
pub mod report;

pub use api::{AnalysesList, AnalysisRequest, AnalysisStarted, ErrorBody, HealthResponse, MarketOverview};
pub use job::{AgentStages, JobId, JobRecord, JobStatus, Stage, StageState, StageStatus};
pub use market::{IndexSelector, Language, SelectorError};
pub use report::{
    CollectedData, EconomicData, IndexQuote, Indicators, KeyLevels, Podcast, Script,
    SectorPerformance, StageOutput, TrendAnalysis, TrendSummary,
};
