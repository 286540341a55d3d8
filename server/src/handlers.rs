use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use common::{
    AnalysesList, AnalysisRequest, AnalysisStarted, ErrorBody, HealthResponse, JobRecord,
    MarketOverview,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::service::ServiceError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(start_analysis))
        .route("/api/analysis/:id", get(get_analysis))
        .route("/api/analyses", get(list_analyses))
        .route("/api/market/overview", get(market_overview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/* ---------------- errores HTTP ---------------- */

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound,
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(inner) => ApiError::Validation(inner.to_string()),
            ServiceError::NotFound(_) => ApiError::NotFound,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "validation_error".to_string(),
                    detail,
                },
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found".to_string(),
                    detail: "Analysis not found".to_string(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "TrendCast India API".to_string(),
    })
}

// Crea el job y deja el pipeline corriendo; responde sin esperar
async fn start_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalysisStarted>), ApiError> {
    let Json(req) = payload.map_err(|rej| {
        warn!("body inválido en /api/analyze: {}", rej.body_text());
        ApiError::Validation(rej.body_text())
    })?;

    let id = state
        .service
        .submit(&req.index, req.language.as_deref())?;

    // el record ya tiene los valores validados
    let rec = state.service.status(&id)?;
    info!("analysis {} aceptado", id);

    Ok((
        StatusCode::CREATED,
        Json(AnalysisStarted {
            analysis_id: id,
            status: "started".to_string(),
            message: format!("Analysis started for {} in {}", rec.index, rec.language),
            timestamp: Utc::now(),
        }),
    ))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    Ok(Json(state.service.status(&id)?))
}

async fn list_analyses(State(state): State<AppState>) -> Json<AnalysesList> {
    let analyses = state.service.recent(state.recent_limit);
    let count = analyses.len();
    Json(AnalysesList { analyses, count })
}

async fn market_overview(State(state): State<AppState>) -> Json<MarketOverview> {
    Json(state.service.market_overview())
}
