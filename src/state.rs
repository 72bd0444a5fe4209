// src/state.rs
// Shared application state for the HTTP server

use std::sync::Arc;

use crate::problems::ProblemService;
use crate::store::TableStore;

#[derive(Clone)]
pub struct AppState {
    pub problems: Arc<ProblemService>,
}

impl AppState {
    pub fn new(problems: ProblemService) -> Self {
        Self {
            problems: Arc::new(problems),
        }
    }

    /// State over `store` with the given service settings
    pub fn with_store(store: Arc<dyn TableStore>, settings: crate::problems::ServiceSettings) -> Self {
        Self::new(ProblemService::new(store, settings))
    }
}
