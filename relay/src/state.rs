use std::sync::Arc;

use common::watcher::WatcherEngine;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<WatcherEngine>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(watcher: Arc<WatcherEngine>, metrics: Option<PrometheusHandle>) -> Self {
        Self { watcher, metrics }
    }
}
