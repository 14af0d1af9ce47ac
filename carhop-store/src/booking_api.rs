use async_trait::async_trait;
use carhop_core::{BookingAcceptance, BookingApi, PendingBookingRecord, RemoteError};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

/// Remote booking API writing straight into the hosted `bookings` table.
///
/// Inserts are keyed by the record id and ignore conflicts, so replaying a record that already
/// landed is accepted without a second row.
pub struct PostgresBookingApi {
    pool: PgPool,
}

impl PostgresBookingApi {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Customer-facing reference for a booking, stable for a given record
pub fn booking_reference(id: Uuid) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("CH-{}", &simple[..10])
}

#[async_trait]
impl BookingApi for PostgresBookingApi {
    async fn create_booking(
        &self,
        record: &PendingBookingRecord,
    ) -> Result<BookingAcceptance, RemoteError> {
        let duration_hours = i32::try_from(record.duration_hours).map_err(|_| {
            RemoteError::Rejected(format!("duration {} out of range", record.duration_hours))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (id, car_id, pickup_location, dropoff_location, pickup_date, pickup_hour, duration_hours, total_price, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.vehicle_id)
        .bind(&record.pickup_location)
        .bind(&record.dropoff_location)
        .bind(record.date)
        .bind(i16::from(record.time.hour()))
        .bind(duration_hours)
        .bind(record.derived_price)
        .bind(record.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            debug!(record_id = %record.id, "Booking already stored, treating as accepted");
        } else {
            info!(record_id = %record.id, "Booking stored");
        }

        Ok(BookingAcceptance {
            reference: booking_reference(record.id),
        })
    }
}

/// Sort a database failure into "try again later" or "the remote said no"
fn classify(err: sqlx::Error) -> RemoteError {
    match err {
        sqlx::Error::Database(db) => RemoteError::Rejected(db.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RemoteError::Unreachable(err.to_string()),
        other => RemoteError::Rejected(other.to_string()),
    }
}

/// Stand-in used when no remote database is configured. Every booking is captured offline.
pub struct UnconfiguredBookingApi;

#[async_trait]
impl BookingApi for UnconfiguredBookingApi {
    async fn create_booking(
        &self,
        _record: &PendingBookingRecord,
    ) -> Result<BookingAcceptance, RemoteError> {
        Err(RemoteError::Unreachable(
            "no remote booking database configured".to_string(),
        ))
    }
}
