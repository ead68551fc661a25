use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use common::models::ChannelInfo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub channel: Option<ChannelInfo>,
    pub last_item_id: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub checks: u64,
    pub notifications_sent: u64,
}

/// Health check endpoint reflecting the watcher state
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.watcher.status().await;

    Json(HealthResponse {
        status: "ok",
        channel: status.channel,
        last_item_id: status.last_item_id,
        last_checked_at: status.last_checked_at,
        last_notified_at: status.last_notified_at,
        last_error: status.last_error,
        checks: status.checks,
        notifications_sent: status.notifications_sent,
    })
}
