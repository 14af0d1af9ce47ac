use carhop_booking::{
    BookingSubmitter, BookingWizard, ConnectivityMonitor, PendingQueue, Reconciler,
};
use carhop_catalog::CatalogProvider;
use carhop_core::{BookingApi, Clock, QueueStore};
use carhop_shared::BookingEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Everything the booking core needs from the outside world
pub struct CoreServices {
    pub catalog: Arc<dyn CatalogProvider>,
    pub api: Arc<dyn BookingApi>,
    pub queue_store: Arc<dyn QueueStore>,
    pub queue_key: String,
    pub monitor: Arc<ConnectivityMonitor>,
    pub clock: Arc<dyn Clock>,
    pub remote_timeout: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub clock: Arc<dyn Clock>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub queue: Arc<PendingQueue>,
    pub submitter: Arc<BookingSubmitter>,
    pub reconciler: Arc<Reconciler>,
    pub drafts: Arc<DraftRegistry>,
    pub events_tx: broadcast::Sender<BookingEvent>,
}

impl AppState {
    pub fn new(services: CoreServices) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let queue = Arc::new(PendingQueue::new(services.queue_store, services.queue_key));

        let submitter = BookingSubmitter::new(
            services.api.clone(),
            queue.clone(),
            services.monitor.clone(),
        )
        .with_timeout(services.remote_timeout)
        .with_events(events_tx.clone());

        let reconciler = Reconciler::new(queue.clone(), services.api)
            .with_timeout(services.remote_timeout)
            .with_events(events_tx.clone());

        Self {
            catalog: services.catalog,
            clock: services.clock,
            monitor: services.monitor,
            queue,
            submitter: Arc::new(submitter),
            reconciler: Arc::new(reconciler),
            drafts: Arc::new(DraftRegistry::default()),
            events_tx,
        }
    }
}

/// Wizards in progress, one per browser session
#[derive(Default)]
pub struct DraftRegistry {
    wizards: RwLock<HashMap<Uuid, Arc<Mutex<BookingWizard>>>>,
}

impl DraftRegistry {
    pub fn insert(&self, wizard: BookingWizard) -> Arc<Mutex<BookingWizard>> {
        let id = wizard.id();
        let wizard = Arc::new(Mutex::new(wizard));
        self.wizards
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, wizard.clone());
        wizard
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<BookingWizard>>> {
        self.wizards
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    /// Drop wizards that were abandoned or whose booking has been captured.
    ///
    /// A wizard is abandoned once `max_age` has passed since it was created; a submitted one is
    /// kept for `keep_submitted` so the client can still read the outcome. Wizards locked by a
    /// request in flight are left for the next sweep. Returns how many were removed.
    pub fn sweep(
        &self,
        now: DateTime<Utc>,
        max_age: chrono::Duration,
        keep_submitted: chrono::Duration,
    ) -> usize {
        let mut wizards = self.wizards.write().unwrap_or_else(|e| e.into_inner());
        let before = wizards.len();
        wizards.retain(|id, wizard| {
            let Ok(wizard) = wizard.try_lock() else {
                return true;
            };
            let expired = match wizard.submitted_at() {
                Some(submitted_at) => now - submitted_at >= keep_submitted,
                None => now - wizard.created_at() >= max_age,
            };
            if expired {
                debug!(draft_id = %id, step = %wizard.step(), "Draft expired");
            }
            !expired
        });
        before - wizards.len()
    }

    pub fn len(&self) -> usize {
        self.wizards.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
