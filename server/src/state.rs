// server/src/state.rs

use crate::service::JobService;

#[derive(Clone)]
pub struct AppState {
    pub service: JobService,
    // cuántos jobs devuelve GET /api/analyses
    pub recent_limit: usize,
}

impl AppState {
    pub fn new(service: JobService, recent_limit: usize) -> Self {
        Self {
            service,
            recent_limit,
        }
    }
}
