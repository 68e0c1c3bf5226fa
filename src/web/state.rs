//! Shared application state for the web API.

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::orchestration::{AssignmentManager, SessionLifecycleManager};
use crate::storage::DispatchStore;

/// State threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub assignments: Arc<AssignmentManager>,
    pub sessions: Arc<SessionLifecycleManager>,
    pub store: Arc<dyn DispatchStore>,
    pub config: Arc<DispatchConfig>,
}

impl AppState {
    pub fn new(
        assignments: Arc<AssignmentManager>,
        sessions: Arc<SessionLifecycleManager>,
        store: Arc<dyn DispatchStore>,
        config: Arc<DispatchConfig>,
    ) -> Self {
        Self {
            assignments,
            sessions,
            store,
            config,
        }
    }
}
