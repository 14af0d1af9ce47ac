use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::AppError;
pub use state::{AppState, CoreServices};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(handlers::vehicles::routes())
        .merge(handlers::drafts::routes())
        .merge(handlers::pending::routes())
        .merge(handlers::connectivity::routes())
        .merge(handlers::events::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "status": "ok",
        "online": state.monitor.is_online(),
        "pending": state.queue.len().await?,
        "drafts": state.drafts.len(),
    })))
}
