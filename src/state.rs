/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Clone is cheap: everything inside is Arc
 */
use std::sync::Arc;

use crate::services::auth::{Authenticator, RequirementRegistry};
use crate::services::metrics_store::MetricsStore;

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub requirements: Arc<RequirementRegistry>,
    pub metrics: Arc<MetricsStore>,
}

impl AppState {
    pub fn new(
        authenticator: Arc<Authenticator>,
        requirements: Arc<RequirementRegistry>,
        metrics: Arc<MetricsStore>,
    ) -> Self {
        Self {
            authenticator,
            requirements,
            metrics,
        }
    }
}
