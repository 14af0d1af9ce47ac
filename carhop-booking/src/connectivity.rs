use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const TRANSITION_CHANNEL_CAPACITY: usize = 32;
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A change of the online flag, as delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectivityTransition {
    /// Value after the change: `true` for offline -> online
    pub online: bool,
    pub at: DateTime<Utc>,
}

/// Something that can tell whether the backend is reachable right now.
///
/// `None` means the probe could not decide; the monitor then assumes online.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> Option<bool>;
}

/// Process-wide online/offline flag with transition notifications.
///
/// Listeners register with `subscribe()` and unregister by dropping the receiver.
pub struct ConnectivityMonitor {
    online: Mutex<bool>,
    transitions: broadcast::Sender<ConnectivityTransition>,
}

impl ConnectivityMonitor {
    /// Start from an initial reachability reading. An undetermined reading starts online.
    pub fn new(initial: Option<bool>) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        let online = initial.unwrap_or(true);
        info!(online, "Connectivity monitor initialized");
        Self {
            online: Mutex::new(online),
            transitions,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityTransition> {
        self.transitions.subscribe()
    }

    /// Record a reachability observation. Returns whether it was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let mut current = self.state();
        if *current == online {
            return false;
        }
        *current = online;

        // Sent under the lock so subscribers see transitions in the order they happened
        let _ = self.transitions.send(ConnectivityTransition {
            online,
            at: Utc::now(),
        });

        if online {
            info!("Connectivity restored");
        } else {
            warn!("Connectivity lost");
        }
        true
    }

    /// Apply a probe reading, failing open when the probe could not decide
    pub fn observe(&self, reading: Option<bool>) -> bool {
        self.set_online(reading.unwrap_or(true))
    }

    /// Poll `probe` every `every` for the lifetime of the process
    pub fn spawn_polling(
        self: Arc<Self>,
        probe: Arc<dyn ReachabilityProbe>,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reading = probe.probe().await;
                debug!(?reading, "Reachability probe finished");
                self.observe(reading);
            }
        })
    }

    fn state(&self) -> MutexGuard<'_, bool> {
        self.online.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Reachability by opening a TCP connection to a known host
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn probe(&self) -> Option<bool> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.addr.as_str())).await {
            Ok(Ok(_)) => Some(true),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::InvalidInput => {
                warn!("Probe address {} is not usable: {}", self.addr, e);
                None
            }
            Ok(Err(_)) | Err(_) => Some(false),
        }
    }
}
