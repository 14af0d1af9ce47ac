use axum::{extract::State, routing::{get, post}, Json, Router};
use carhop_booking::ReconcileOutcome;
use carhop_core::PendingBookingRecord;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub online: bool,
    pub count: usize,
    /// Oldest first, the order they will be synced in
    pub records: Vec<PendingBookingRecord>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pending", get(list_pending))
        .route("/v1/pending/reconcile", post(reconcile_now))
}

pub async fn list_pending(State(state): State<AppState>) -> Result<Json<PendingResponse>, AppError> {
    let records = state.queue.drain_all().await?;
    Ok(Json(PendingResponse {
        online: state.monitor.is_online(),
        count: records.len(),
        records,
    }))
}

/// Manual "retry now". Runs the pass inline and reports what it did.
pub async fn reconcile_now(State(state): State<AppState>) -> Json<ReconcileOutcome> {
    Json(state.reconciler.reconcile().await)
}
