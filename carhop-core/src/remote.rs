use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::PendingBookingRecord;

/// Acknowledgement returned by the remote booking API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAcceptance {
    /// Reference the remote system files the booking under
    pub reference: String,
}

/// Why the remote did not take a booking.
///
/// The two cases are handled differently: a rejection is reported back to the user, while
/// unreachability sends the booking to the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote rejected booking: {0}")]
    Rejected(String),

    #[error("Remote unreachable: {0}")]
    Unreachable(String),
}

/// The hosted backend that stores confirmed bookings
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Write one booking. Implementations must accept a record id they already hold without
    /// creating a second booking, so a retried sync never duplicates.
    async fn create_booking(
        &self,
        record: &PendingBookingRecord,
    ) -> Result<BookingAcceptance, RemoteError>;
}
