use carhop_core::{BookingApi, BookingError, BookingResult, PendingBookingRecord, RemoteError};
use carhop_shared::models::events::{BookingConfirmedEvent, BookingQueuedEvent};
use carhop_shared::BookingEvent;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::connectivity::ConnectivityMonitor;
use crate::queue::PendingQueue;

/// Default bound on a single remote booking write
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// How a successful submission was captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitOutcome {
    /// The remote accepted the booking
    Confirmed { record_id: Uuid, reference: String },
    /// Stored locally, will be synced when connectivity returns
    Queued { record_id: Uuid },
}

impl SubmitOutcome {
    pub fn record_id(&self) -> Uuid {
        match self {
            SubmitOutcome::Confirmed { record_id, .. } | SubmitOutcome::Queued { record_id } => {
                *record_id
            }
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, SubmitOutcome::Queued { .. })
    }
}

/// Routes a frozen booking to the remote API or, when the remote is out of reach, to the
/// pending queue.
pub struct BookingSubmitter {
    api: Arc<dyn BookingApi>,
    queue: Arc<PendingQueue>,
    monitor: Arc<ConnectivityMonitor>,
    timeout: Duration,
    events: Option<broadcast::Sender<BookingEvent>>,
}

impl BookingSubmitter {
    pub fn new(
        api: Arc<dyn BookingApi>,
        queue: Arc<PendingQueue>,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            api,
            queue,
            monitor,
            timeout: DEFAULT_REMOTE_TIMEOUT,
            events: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<BookingEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn submit(&self, record: &PendingBookingRecord) -> BookingResult<SubmitOutcome> {
        if !self.monitor.is_online() {
            return self.enqueue(record).await;
        }

        match tokio::time::timeout(self.timeout, self.api.create_booking(record)).await {
            Ok(Ok(acceptance)) => {
                info!(record_id = %record.id, reference = %acceptance.reference, "Booking confirmed");
                self.publish(BookingEvent::BookingConfirmed(BookingConfirmedEvent {
                    record_id: record.id,
                    reference: acceptance.reference.clone(),
                    confirmed_at: chrono::Utc::now(),
                }));
                Ok(SubmitOutcome::Confirmed {
                    record_id: record.id,
                    reference: acceptance.reference,
                })
            }
            Ok(Err(RemoteError::Rejected(reason))) => {
                warn!(record_id = %record.id, "Booking rejected by remote: {}", reason);
                Err(BookingError::SubmissionRejected(reason))
            }
            Ok(Err(RemoteError::Unreachable(reason))) => {
                warn!(record_id = %record.id, "Remote unreachable, queueing booking: {}", reason);
                self.enqueue(record).await
            }
            Err(_) => {
                // A slow remote is a failure unless the monitor has meanwhile seen the link drop
                if !self.monitor.is_online() {
                    warn!(record_id = %record.id, "Remote timed out while offline, queueing booking");
                    return self.enqueue(record).await;
                }
                let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(record_id = %record.id, "Booking submission timed out after {} ms", millis);
                Err(BookingError::SubmissionTimedOut(millis))
            }
        }
    }

    async fn enqueue(&self, record: &PendingBookingRecord) -> BookingResult<SubmitOutcome> {
        self.queue.enqueue(record).await.map_err(|e| {
            error!(record_id = %record.id, "Booking not captured, queue write failed: {}", e);
            BookingError::QueuePersistence(e.to_string())
        })?;

        self.publish(BookingEvent::BookingQueued(BookingQueuedEvent {
            record_id: record.id,
            vehicle_id: record.vehicle_id,
            submitted_at: record.submitted_at,
        }));
        Ok(SubmitOutcome::Queued {
            record_id: record.id,
        })
    }

    fn publish(&self, event: BookingEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.send(event);
        }
    }
}
