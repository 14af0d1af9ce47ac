use crate::draft::{DraftField, WizardStep};

/// Errors surfaced by the booking capture flow.
///
/// `Validation`, `InvalidTransition`, `SubmissionRejected` and `SubmissionTimedOut` leave the
/// draft untouched so the user can fix it and retry. `QueuePersistence` means the booking was not
/// captured anywhere. Remote unreachability never shows up here: it is turned into a queued
/// submission.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed on {field}: {reason}")]
    Validation { field: DraftField, reason: String },

    #[error("Cannot {action} while in {from}")]
    InvalidTransition { from: WizardStep, action: &'static str },

    #[error("Booking rejected: {0}")]
    SubmissionRejected(String),

    #[error("Booking submission timed out after {0} ms")]
    SubmissionTimedOut(u64),

    #[error("Booking was not captured, local queue write failed: {0}")]
    QueuePersistence(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(String),
}

impl BookingError {
    pub fn validation(field: DraftField, reason: impl Into<String>) -> Self {
        BookingError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Field at fault, for validation failures
    pub fn field(&self) -> Option<DraftField> {
        match self {
            BookingError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Whether the user can retry after this error without losing the draft
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookingError::QueuePersistence(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = BookingError::validation(DraftField::DropoffLocation, "required");
        assert_eq!(err.field(), Some(DraftField::DropoffLocation));
        assert_eq!(err.to_string(), "Validation failed on dropoffLocation: required");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_queue_persistence_is_fatal() {
        let err = BookingError::QueuePersistence("disk full".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.field(), None);
    }
}
