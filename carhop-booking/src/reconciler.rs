use carhop_core::{BookingApi, RemoteError};
use carhop_shared::models::events::BookingSyncedEvent;
use carhop_shared::BookingEvent;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::queue::PendingQueue;
use crate::submission::DEFAULT_REMOTE_TIMEOUT;

/// Why a drain pass stopped before emptying the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    Rejected(String),
    Unreachable(String),
    TimedOut,
    Storage(String),
}

/// Totals across the passes of one `reconcile()` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub passes: u32,
    pub attempted: usize,
    pub synced: usize,
    /// Records still queued after the last pass
    pub remaining: usize,
    /// Set when the last pass stopped early
    pub stopped: Option<StopReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// A pass was already running; it will run once more before finishing
    Coalesced,
}

#[derive(Debug, Default)]
struct PassState {
    running: bool,
    rerun_requested: bool,
}

/// Flushes the pending queue to the remote booking API.
///
/// Records are attempted oldest first and each is removed only once the remote accepted it. The
/// first failure ends the pass so later bookings never overtake earlier ones. At most one pass
/// runs at a time; calls made while one is running fold into a single extra pass.
pub struct Reconciler {
    queue: Arc<PendingQueue>,
    api: Arc<dyn BookingApi>,
    timeout: Duration,
    events: Option<broadcast::Sender<BookingEvent>>,
    state: Mutex<PassState>,
}

impl Reconciler {
    pub fn new(queue: Arc<PendingQueue>, api: Arc<dyn BookingApi>) -> Self {
        Self {
            queue,
            api,
            timeout: DEFAULT_REMOTE_TIMEOUT,
            events: None,
            state: Mutex::new(PassState::default()),
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

    /// Drain the queue now. Shared by the reconnect watcher and manual "retry now".
    pub async fn reconcile(&self) -> ReconcileOutcome {
        let mut pass = match ActivePass::begin(&self.state) {
            Some(pass) => pass,
            None => {
                debug!("Reconcile pass already running, scheduling one more");
                return ReconcileOutcome::Coalesced;
            }
        };

        let mut report = ReconcileReport::default();
        loop {
            self.run_pass(&mut report).await;
            if !pass.rerun_or_finish() {
                break;
            }
            debug!("Running requested follow-up reconcile pass");
        }

        info!(
            passes = report.passes,
            synced = report.synced,
            remaining = report.remaining,
            "Reconcile finished"
        );
        ReconcileOutcome::Completed(report)
    }

    /// React to every offline -> online transition for the lifetime of the process
    pub fn watch(self: &Arc<Self>, monitor: Arc<ConnectivityMonitor>) -> JoinHandle<()> {
        let mut transitions = monitor.subscribe();
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let came_online = match transitions.recv().await {
                    Ok(transition) => transition.online,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} connectivity transitions", skipped);
                        monitor.is_online()
                    }
                    Err(RecvError::Closed) => break,
                };
                if came_online {
                    let reconciler = Arc::clone(&reconciler);
                    // Spawned so the watcher keeps reading transitions during a long pass
                    tokio::spawn(async move {
                        reconciler.reconcile().await;
                    });
                }
            }
        })
    }

    async fn run_pass(&self, report: &mut ReconcileReport) {
        report.passes += 1;
        report.stopped = None;

        let records = match self.queue.drain_all().await {
            Ok(records) => records,
            Err(e) => {
                error!("Could not read pending bookings: {}", e);
                report.stopped = Some(StopReason::Storage(e.to_string()));
                return;
            }
        };

        for record in &records {
            report.attempted += 1;
            let result = tokio::time::timeout(self.timeout, self.api.create_booking(record)).await;
            let acceptance = match result {
                Ok(Ok(acceptance)) => acceptance,
                Ok(Err(RemoteError::Rejected(reason))) => {
                    warn!(record_id = %record.id, "Queued booking rejected, stopping pass: {}", reason);
                    report.stopped = Some(StopReason::Rejected(reason));
                    break;
                }
                Ok(Err(RemoteError::Unreachable(reason))) => {
                    warn!(record_id = %record.id, "Remote unreachable, stopping pass: {}", reason);
                    report.stopped = Some(StopReason::Unreachable(reason));
                    break;
                }
                Err(_) => {
                    warn!(record_id = %record.id, "Remote timed out, stopping pass");
                    report.stopped = Some(StopReason::TimedOut);
                    break;
                }
            };

            if let Err(e) = self.queue.remove(record).await {
                // Still queued; the remote treats the retry of a known id as already accepted
                error!(record_id = %record.id, "Synced booking could not be dequeued: {}", e);
                report.stopped = Some(StopReason::Storage(e.to_string()));
                break;
            }

            report.synced += 1;
            info!(record_id = %record.id, reference = %acceptance.reference, "Queued booking synced");
            if let Some(events) = &self.events {
                let _ = events.send(BookingEvent::BookingSynced(BookingSyncedEvent {
                    record_id: record.id,
                    reference: acceptance.reference,
                    submitted_at: record.submitted_at,
                    synced_at: chrono::Utc::now(),
                }));
            }
        }

        report.remaining = match self.queue.len().await {
            Ok(len) => len,
            Err(_) => records.len().saturating_sub(report.synced),
        };
    }
}

/// Ownership of the single running pass.
///
/// Dropping it without finishing (the caller's future was cancelled) releases the slot.
struct ActivePass<'a> {
    state: &'a Mutex<PassState>,
    finished: bool,
}

impl<'a> ActivePass<'a> {
    fn begin(state: &'a Mutex<PassState>) -> Option<Self> {
        let mut guard = lock(state);
        if guard.running {
            guard.rerun_requested = true;
            return None;
        }
        guard.running = true;
        Some(Self {
            state,
            finished: false,
        })
    }

    /// Consume a pending rerun request, or release the slot. Both under one lock, so a request
    /// arriving concurrently is never lost.
    fn rerun_or_finish(&mut self) -> bool {
        let mut guard = lock(self.state);
        if guard.rerun_requested {
            guard.rerun_requested = false;
            return true;
        }
        guard.running = false;
        self.finished = true;
        false
    }
}

impl Drop for ActivePass<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.state).running = false;
        }
    }
}

fn lock(state: &Mutex<PassState>) -> MutexGuard<'_, PassState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
