use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use carhop_api::{app, AppState, CoreServices};
use carhop_booking::{ConnectivityMonitor, MemoryQueueStore};
use carhop_catalog::{InMemoryCatalog, Vehicle, VehicleCategory};
use carhop_core::{BookingAcceptance, BookingApi, FixedClock, PendingBookingRecord, RemoteError};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct AcceptingApi {
    calls: AtomicUsize,
}

#[async_trait]
impl BookingApi for AcceptingApi {
    async fn create_booking(
        &self,
        record: &PendingBookingRecord,
    ) -> Result<BookingAcceptance, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BookingAcceptance {
            reference: format!("CH-{}", record.id.simple()),
        })
    }
}

struct TestApp {
    state: AppState,
    api: Arc<AcceptingApi>,
    vehicle: Vehicle,
}

impl TestApp {
    fn new(online: bool) -> Self {
        let vehicle = Vehicle::new("Renault Clio", VehicleCategory::Economy, 5, 20);
        let catalog: InMemoryCatalog = vec![vehicle.clone()].into_iter().collect();
        let api = Arc::new(AcceptingApi::default());

        let state = AppState::new(CoreServices {
            catalog: Arc::new(catalog),
            api: api.clone(),
            queue_store: Arc::new(MemoryQueueStore::new()),
            queue_key: "pendingBookings".to_string(),
            monitor: Arc::new(ConnectivityMonitor::new(Some(online))),
            clock: Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap(),
            )),
            remote_timeout: Duration::from_secs(1),
        });

        Self {
            state,
            api,
            vehicle,
        }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Create a draft and walk it to the confirmation step
    async fn confirmed_draft(&self) -> String {
        let (status, draft) = self.send("POST", "/v1/drafts", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = draft["id"].as_str().unwrap().to_string();

        let steps = [
            ("PUT", "vehicle", Some(json!({ "vehicleId": self.vehicle.id }))),
            ("POST", "advance", None),
            (
                "PUT",
                "locations",
                Some(json!({ "pickupLocation": "Central Station", "dropoffLocation": "Airport" })),
            ),
            ("POST", "advance", None),
            (
                "PUT",
                "schedule",
                Some(json!({ "date": "2026-10-19", "time": "10:00", "durationHours": 3 })),
            ),
            ("POST", "advance", None),
        ];
        for (method, action, body) in steps {
            let (status, body) = self
                .send(method, &format!("/v1/drafts/{}/{}", id, action), body)
                .await;
            assert_eq!(status, StatusCode::OK, "{} {} failed: {}", method, action, body);
        }
        id
    }
}

#[tokio::test]
async fn test_offline_booking_is_queued_then_synced() {
    let app = TestApp::new(false);
    let id = app.confirmed_draft().await;

    let (_, draft) = app.send("GET", &format!("/v1/drafts/{}", id), None).await;
    assert_eq!(draft["step"], "CONFIRMING");
    assert_eq!(draft["derivedPrice"], 60);
    assert_eq!(draft["draft"]["pickupLocation"], "Central Station");
    assert_eq!(draft["draft"]["durationHours"], 3);

    let (status, submitted) = app
        .send("POST", &format!("/v1/drafts/{}/submit", id), None)
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(submitted["outcome"]["status"], "QUEUED");
    assert_eq!(submitted["draft"]["step"], "SUBMITTED");
    assert_eq!(app.api.calls.load(Ordering::SeqCst), 0);

    let (_, pending) = app.send("GET", "/v1/pending", None).await;
    assert_eq!(pending["count"], 1);
    assert_eq!(pending["online"], false);
    assert_eq!(pending["records"][0]["derivedPrice"], 60);
    assert_eq!(pending["records"][0]["time"], "10:00");

    let (_, connectivity) = app
        .send("PUT", "/v1/connectivity", Some(json!({ "online": true })))
        .await;
    assert_eq!(connectivity["changed"], true);

    let (status, report) = app.send("POST", "/v1/pending/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "COMPLETED");
    assert_eq!(report["synced"], 1);
    assert_eq!(report["remaining"], 0);
    assert_eq!(app.api.calls.load(Ordering::SeqCst), 1);

    let (_, pending) = app.send("GET", "/v1/pending", None).await;
    assert_eq!(pending["count"], 0);
}

#[tokio::test]
async fn test_online_booking_is_confirmed() {
    let app = TestApp::new(true);
    let id = app.confirmed_draft().await;

    let (status, submitted) = app
        .send("POST", &format!("/v1/drafts/{}/submit", id), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted["outcome"]["status"], "CONFIRMED");
    assert!(submitted["outcome"]["reference"].as_str().unwrap().starts_with("CH-"));
    assert_eq!(app.api.calls.load(Ordering::SeqCst), 1);

    let (_, health) = app.send("GET", "/health", None).await;
    assert_eq!(health["pending"], 0);
}

#[tokio::test]
async fn test_missing_dropoff_names_the_field() {
    let app = TestApp::new(true);
    let (_, draft) = app.send("POST", "/v1/drafts", None).await;
    let id = draft["id"].as_str().unwrap().to_string();

    app.send(
        "PUT",
        &format!("/v1/drafts/{}/vehicle", id),
        Some(json!({ "vehicleId": app.vehicle.id })),
    )
    .await;
    app.send("POST", &format!("/v1/drafts/{}/advance", id), None)
        .await;
    app.send(
        "PUT",
        &format!("/v1/drafts/{}/locations", id),
        Some(json!({ "pickupLocation": "Central Station", "dropoffLocation": "  " })),
    )
    .await;

    let (status, error) = app
        .send("POST", &format!("/v1/drafts/{}/advance", id), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["field"], "dropoffLocation");

    let (_, draft) = app.send("GET", &format!("/v1/drafts/{}", id), None).await;
    assert_eq!(draft["step"], "ENTERING_LOCATION");
    assert_eq!(draft["canAdvance"], false);
}

#[tokio::test]
async fn test_malformed_time_is_a_validation_error() {
    let app = TestApp::new(true);
    let (_, draft) = app.send("POST", "/v1/drafts", None).await;
    let id = draft["id"].as_str().unwrap().to_string();

    let (status, error) = app
        .send(
            "PUT",
            &format!("/v1/drafts/{}/schedule", id),
            Some(json!({ "time": "10:30" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["field"], "time");
}

#[tokio::test]
async fn test_editing_outside_owning_step_conflicts() {
    let app = TestApp::new(true);
    let (_, draft) = app.send("POST", "/v1/drafts", None).await;
    let id = draft["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            "PUT",
            &format!("/v1/drafts/{}/schedule", id),
            Some(json!({ "date": "2026-10-19", "time": "10:00", "durationHours": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_resources_are_not_found() {
    let app = TestApp::new(true);
    let missing = uuid::Uuid::new_v4();

    let (status, _) = app.send("GET", &format!("/v1/drafts/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("GET", &format!("/v1/vehicles/{}", missing), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, vehicles) = app.send("GET", "/v1/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicles.as_array().unwrap().len(), 1);
}
