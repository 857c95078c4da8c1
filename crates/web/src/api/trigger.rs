//! Manual send trigger.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use menumailer_core::errors::SchedulerError;
use menumailer_core::models::ManualOutcome;

use crate::api::status::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/send-now", post(send_now))
}

/// Run one attempt for today and report how it went. Answers 409 while
/// another attempt is still running.
async fn send_now(State(state): State<Arc<AppState>>) -> Result<Json<ManualOutcome>, AppError> {
    info!("manual send requested over HTTP");
    match state.scheduler.send_now().await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e @ SchedulerError::AttemptInFlight { .. }) => Err(AppError::Conflict(e.to_string())),
    }
}
