use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use carhop_booking::{BookingWizard, SubmitOutcome, WizardSnapshot};
use carhop_core::{BookingError, DraftField, HourSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

// Draft bodies use the same field names as the error `field` and the queued record

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectVehicleRequest {
    pub vehicle_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsRequest {
    pub pickup_location: String,
    pub dropoff_location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub date: Option<NaiveDate>,
    /// `"HH:00"`
    pub time: Option<String>,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub draft: WizardSnapshot,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/drafts", post(create_draft))
        .route("/v1/drafts/{id}", get(get_draft))
        .route("/v1/drafts/{id}/vehicle", put(select_vehicle))
        .route("/v1/drafts/{id}/locations", put(set_locations))
        .route("/v1/drafts/{id}/schedule", put(set_schedule))
        .route("/v1/drafts/{id}/advance", post(advance))
        .route("/v1/drafts/{id}/retreat", post(retreat))
        .route("/v1/drafts/{id}/submit", post(submit))
}

fn find_draft(state: &AppState, id: Uuid) -> Result<Arc<Mutex<BookingWizard>>, AppError> {
    state
        .drafts
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Draft not found: {}", id)))
}

pub async fn create_draft(State(state): State<AppState>) -> (StatusCode, Json<WizardSnapshot>) {
    let wizard = BookingWizard::new(state.catalog.clone(), state.clock.clone());
    let snapshot = wizard.snapshot();
    state.drafts.insert(wizard);
    info!(draft_id = %snapshot.id, "Draft created");
    (StatusCode::CREATED, Json(snapshot))
}

pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = find_draft(&state, id)?;
    let wizard = wizard.lock().await;
    Ok(Json(wizard.snapshot()))
}

pub async fn select_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectVehicleRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    wizard.select_vehicle(req.vehicle_id).await?;
    Ok(Json(wizard.snapshot()))
}

pub async fn set_locations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LocationsRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    wizard.set_locations(req.pickup_location, req.dropoff_location)?;
    Ok(Json(wizard.snapshot()))
}

pub async fn set_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let time = req
        .time
        .as_deref()
        .map(str::parse::<HourSlot>)
        .transpose()
        .map_err(|e| BookingError::validation(DraftField::Time, e.to_string()))?;

    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    wizard.set_schedule(req.date, time, req.duration_hours)?;
    Ok(Json(wizard.snapshot()))
}

pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    wizard.advance()?;
    Ok(Json(wizard.snapshot()))
}

pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardSnapshot>, AppError> {
    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    wizard.retreat()?;
    Ok(Json(wizard.snapshot()))
}

/// Confirm the booking. Answers 201 when the remote took it and 202 when it was queued.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let wizard = find_draft(&state, id)?;
    let mut wizard = wizard.lock().await;
    let outcome = wizard.submit(&state.submitter).await?;

    let status = if outcome.is_queued() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(SubmitResponse {
            outcome,
            draft: wizard.snapshot(),
        }),
    ))
}
