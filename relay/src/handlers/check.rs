use axum::extract::State;
use common::errors::ApiError;
use common::models::FeedItem;
use common::watcher::{CheckOutcome, TestNotifyError, Watcher};

use super::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

/// Run one feed check immediately
#[tracing::instrument(skip(state))]
pub async fn trigger_check(
    State(state): State<AppState>,
) -> Result<SuccessResponse<CheckOutcome>, ErrorResponse> {
    tracing::info!("Manual feed check requested");

    let outcome = state
        .watcher
        .check_for_new_item()
        .await
        .map_err(|e| ErrorResponse::from(ApiError::from(e)))?;

    Ok(SuccessResponse::new(outcome))
}

/// Send a notification for the current feed head without recording it
#[tracing::instrument(skip(state))]
pub async fn send_test_notification(
    State(state): State<AppState>,
) -> Result<SuccessResponse<FeedItem>, ErrorResponse> {
    tracing::info!("Test notification requested");

    let item = state
        .watcher
        .send_test_notification()
        .await
        .map_err(|e| {
            let api_error = match e {
                TestNotifyError::Feed(e) => ApiError::from(e),
                TestNotifyError::Notify(e) => ApiError::from(e),
            };
            ErrorResponse::from(api_error)
        })?
        .ok_or_else(|| ErrorResponse::new("not_found", "Feed has no items"))?;

    Ok(SuccessResponse::new(item))
}
