use anyhow::Context;
use carhop_booking::{
    ConnectivityMonitor, ConnectivityTransition, MemoryQueueStore, ReachabilityProbe, TcpProbe,
};
use carhop_catalog::{CatalogProvider, InMemoryCatalog};
use carhop_core::{BookingApi, QueueStore, SystemClock};
use carhop_shared::models::events::ConnectivityChangedEvent;
use carhop_shared::BookingEvent;
use carhop_store::app_config::{DraftConfig, QueueConfig};
use carhop_store::{
    Config, DbClient, FileQueueStore, PostgresBookingApi, PostgresCatalog, QueueBackend,
    RedisQueueStore, UnconfiguredBookingApi,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::state::{AppState, CoreServices};

/// Wire the booking core from configuration. Nothing here requires the remote to be up.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let queue_store = open_queue_store(&config.queue).await?;
    let (catalog, api) = connect_remote(config).await?;

    let initial = match &config.connectivity.probe_addr {
        Some(addr) => TcpProbe::new(addr.clone(), config.connectivity.probe_timeout()).probe().await,
        None => None,
    };
    let monitor = Arc::new(ConnectivityMonitor::new(initial));

    Ok(AppState::new(CoreServices {
        catalog,
        api,
        queue_store,
        queue_key: config.queue.key.clone(),
        monitor,
        clock: Arc::new(SystemClock),
        remote_timeout: config.remote.timeout(),
    }))
}

async fn open_queue_store(config: &QueueConfig) -> anyhow::Result<Arc<dyn QueueStore>> {
    let store: Arc<dyn QueueStore> = match config.backend {
        QueueBackend::File => {
            let store = FileQueueStore::open(config.dir.clone())
                .await
                .with_context(|| format!("Failed to open queue directory {}", config.dir.display()))?;
            Arc::new(store)
        }
        QueueBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("queue.redis_url is required for the redis backend")?;
            Arc::new(RedisQueueStore::new(url)?)
        }
        QueueBackend::Memory => {
            warn!("Memory queue selected, offline bookings will not survive a restart");
            Arc::new(MemoryQueueStore::new())
        }
    };
    info!(backend = ?config.backend, key = %config.key, "Pending booking queue ready");
    Ok(store)
}

async fn connect_remote(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogProvider>, Arc<dyn BookingApi>)> {
    let Some(url) = &config.remote.database_url else {
        warn!(
            vehicles = config.catalog.seed.len(),
            "No remote database configured, serving the seed catalog and queueing every booking"
        );
        let catalog: InMemoryCatalog = config.catalog.seed.iter().cloned().collect();
        return Ok((Arc::new(catalog), Arc::new(UnconfiguredBookingApi)));
    };

    let db = DbClient::connect_lazy(url).context("Invalid remote.database_url")?;
    if config.remote.run_migrations {
        if let Err(e) = db.migrate().await {
            // Offline at startup is expected; the schema is applied on a later start
            warn!("Database migrations skipped: {}", e);
        }
    }

    Ok((
        Arc::new(PostgresCatalog::new(db.pool.clone())),
        Arc::new(PostgresBookingApi::new(db.pool)),
    ))
}

/// Start the long-running tasks: reachability polling, the reconnect watcher, the event
/// forwarder, the draft sweeper and a first drain of whatever an earlier run left queued.
pub fn spawn_background(state: &AppState, config: &Config) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    let connectivity = &config.connectivity;
    if let Some(addr) = &connectivity.probe_addr {
        let probe: Arc<dyn ReachabilityProbe> =
            Arc::new(TcpProbe::new(addr.clone(), connectivity.probe_timeout()));
        tasks.push(state.monitor.clone().spawn_polling(probe, connectivity.probe_interval()));
        info!("Polling {} every {:?}", addr, connectivity.probe_interval());
    }

    tasks.push(state.reconciler.watch(state.monitor.clone()));
    tasks.push(forward_connectivity(state));
    tasks.push(sweep_drafts(state, &config.drafts));

    if state.monitor.is_online() {
        let reconciler = state.reconciler.clone();
        tasks.push(tokio::spawn(async move {
            reconciler.reconcile().await;
        }));
    }

    tasks
}

/// Periodically drop abandoned and already-submitted wizards
fn sweep_drafts(state: &AppState, config: &DraftConfig) -> JoinHandle<()> {
    let drafts = state.drafts.clone();
    let clock = state.clock.clone();
    let max_age = chrono::Duration::from_std(config.ttl()).unwrap_or(chrono::Duration::MAX);
    let keep_submitted =
        chrono::Duration::from_std(config.submitted_retention()).unwrap_or(chrono::Duration::MAX);
    let period = config.sweep_interval().max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = drafts.sweep(clock.now(), max_age, keep_submitted);
            if removed > 0 {
                info!(removed, remaining = drafts.len(), "Expired drafts swept");
            }
        }
    })
}

/// Republish monitor transitions on the UI event stream
fn forward_connectivity(state: &AppState) -> JoinHandle<()> {
    let mut transitions = state.monitor.subscribe();
    let events_tx = state.events_tx.clone();
    tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(ConnectivityTransition { online, at }) => {
                    let _ = events_tx.send(BookingEvent::ConnectivityChanged(
                        ConnectivityChangedEvent {
                            online,
                            changed_at: at,
                        },
                    ));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event forwarder missed {} connectivity transitions", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carhop_store::app_config::{CatalogConfig, ConnectivityConfig, RemoteConfig, ServerConfig};

    fn memory_config() -> Config {
        Config {
            server: ServerConfig { port: 0 },
            queue: QueueConfig {
                backend: QueueBackend::Memory,
                ..QueueConfig::default()
            },
            remote: RemoteConfig::default(),
            connectivity: ConnectivityConfig::default(),
            catalog: CatalogConfig {
                seed: vec![carhop_catalog::Vehicle::new(
                    "Fiat Panda",
                    carhop_catalog::VehicleCategory::Economy,
                    4,
                    15,
                )],
            },
            drafts: DraftConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_without_database_bookings_are_queued() {
        let state = build_state(&memory_config()).await.unwrap();
        assert_eq!(state.catalog.list_vehicles().await.unwrap().len(), 1);
        // Fails open without a probe
        assert!(state.monitor.is_online());
    }

    #[tokio::test]
    async fn test_redis_backend_requires_url() {
        let mut config = memory_config();
        config.queue.backend = QueueBackend::Redis;
        assert!(build_state(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_transitions_reach_event_stream() {
        let state = build_state(&memory_config()).await.unwrap();
        let mut events = state.events_tx.subscribe();
        let tasks = spawn_background(&state, &memory_config());

        state.monitor.set_online(false);
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                if let Ok(BookingEvent::ConnectivityChanged(e)) = events.recv().await {
                    return e;
                }
            }
        })
        .await
        .unwrap();
        assert!(!event.online);

        for task in tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_sweeper_drops_expired_drafts() {
        let mut config = memory_config();
        config.drafts = DraftConfig {
            ttl_secs: 0,
            submitted_retention_secs: 0,
            sweep_interval_secs: 1,
        };
        let state = build_state(&config).await.unwrap();
        for _ in 0..50 {
            state.drafts.insert(carhop_booking::BookingWizard::new(
                state.catalog.clone(),
                state.clock.clone(),
            ));
        }
        assert_eq!(state.drafts.len(), 50);

        let tasks = spawn_background(&state, &config);
        // The first tick fires immediately
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while !state.drafts.is_empty() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        for task in tasks {
            task.abort();
        }
    }
}
