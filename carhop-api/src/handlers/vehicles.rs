use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use carhop_catalog::Vehicle;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/vehicles", get(list_vehicles))
        .route("/v1/vehicles/{id}", get(get_vehicle))
}

pub async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(state.catalog.list_vehicles().await?))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    state
        .catalog
        .get_vehicle(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Vehicle not found: {}", id)))
}
