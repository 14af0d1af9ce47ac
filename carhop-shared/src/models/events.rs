use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectivityChangedEvent {
    pub online: bool,
    pub changed_at: DateTime<Utc>,
}

/// Emitted when a booking was captured locally because the remote was out of reach.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingQueuedEvent {
    pub record_id: Uuid,
    pub vehicle_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingConfirmedEvent {
    pub record_id: Uuid,
    pub reference: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Emitted by the reconciler once a queued booking has been accepted remotely.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingSyncedEvent {
    pub record_id: Uuid,
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

/// Envelope pushed to the UI event stream.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    ConnectivityChanged(ConnectivityChangedEvent),
    BookingQueued(BookingQueuedEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingSynced(BookingSyncedEvent),
}

impl BookingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::ConnectivityChanged(_) => "connectivity_changed",
            BookingEvent::BookingQueued(_) => "booking_queued",
            BookingEvent::BookingConfirmed(_) => "booking_confirmed",
            BookingEvent::BookingSynced(_) => "booking_synced",
        }
    }
}
