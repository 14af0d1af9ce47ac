use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carhop_catalog::CatalogError;
use carhop_core::{BookingError, StoreError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self::Booking(BookingError::Catalog(err.to_string()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Anyhow(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field = None;
        let (status, error_message) = match &self {
            AppError::Booking(err) => {
                field = err.field();
                let status = match err {
                    BookingError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    BookingError::SubmissionRejected(_) => StatusCode::CONFLICT,
                    BookingError::SubmissionTimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
                    BookingError::Catalog(_) => StatusCode::SERVICE_UNAVAILABLE,
                    BookingError::QueuePersistence(_) => {
                        tracing::error!("Booking lost, queue write failed: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "field": field,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carhop_core::{DraftField, WizardStep};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::from(BookingError::validation(DraftField::DropoffLocation, "required")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(BookingError::InvalidTransition {
                    from: WizardStep::Submitted,
                    action: "advance",
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(BookingError::SubmissionTimedOut(10_000)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AppError::from(BookingError::QueuePersistence("disk full".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::NotFound("Draft not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
