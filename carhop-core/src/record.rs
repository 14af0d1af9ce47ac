use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::{BookingDraft, DraftField, HourSlot};
use crate::error::{BookingError, BookingResult};

/// Frozen snapshot of a submitted draft.
///
/// This is both the payload sent to the remote booking API and the entry written to the pending
/// queue. It is never mutated after `freeze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBookingRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub date: NaiveDate,
    pub time: HourSlot,
    pub duration_hours: u32,
    pub derived_price: i32,
    pub submitted_at: DateTime<Utc>,
}

impl PendingBookingRecord {
    /// Freeze a completed draft. Every required field must be present.
    pub fn freeze(
        draft: &BookingDraft,
        derived_price: i32,
        submitted_at: DateTime<Utc>,
    ) -> BookingResult<Self> {
        let vehicle_id = draft
            .vehicle_id
            .ok_or_else(|| BookingError::validation(DraftField::VehicleId, "required"))?;
        let pickup_location = non_empty(&draft.pickup_location, DraftField::PickupLocation)?;
        let dropoff_location = non_empty(&draft.dropoff_location, DraftField::DropoffLocation)?;
        let date = draft
            .date
            .ok_or_else(|| BookingError::validation(DraftField::Date, "required"))?;
        let time = draft
            .time
            .ok_or_else(|| BookingError::validation(DraftField::Time, "required"))?;
        let duration_hours = draft
            .duration_hours
            .ok_or_else(|| BookingError::validation(DraftField::DurationHours, "required"))?;

        Ok(Self {
            id: Uuid::new_v4(),
            vehicle_id,
            pickup_location,
            dropoff_location,
            date,
            time,
            duration_hours,
            derived_price,
            submitted_at,
        })
    }
}

fn non_empty(value: &str, field: DraftField) -> BookingResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::validation(field, "required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complete_draft() -> BookingDraft {
        BookingDraft {
            vehicle_id: Some(Uuid::new_v4()),
            pickup_location: " Central Station ".to_string(),
            dropoff_location: "Airport T2".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 20),
            time: Some(HourSlot::new(9).unwrap()),
            duration_hours: Some(3),
        }
    }

    #[test]
    fn test_freeze_complete_draft() {
        let draft = complete_draft();
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 8, 30, 0).unwrap();
        let record = PendingBookingRecord::freeze(&draft, 60, at).unwrap();

        assert_eq!(Some(record.vehicle_id), draft.vehicle_id);
        assert_eq!(record.pickup_location, "Central Station");
        assert_eq!(record.derived_price, 60);
        assert_eq!(record.submitted_at, at);
    }

    #[test]
    fn test_freeze_reports_first_missing_field() {
        let mut draft = complete_draft();
        draft.dropoff_location = "   ".to_string();
        draft.time = None;

        let err = PendingBookingRecord::freeze(&draft, 60, Utc::now()).unwrap_err();
        assert_eq!(err.field(), Some(DraftField::DropoffLocation));
    }

    #[test]
    fn test_wire_format_round_trip() {
        let submitted_at = Utc
            .with_ymd_and_hms(2026, 10, 18, 8, 30, 15)
            .unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let record = PendingBookingRecord::freeze(&complete_draft(), 60, submitted_at).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2026-10-20");
        assert_eq!(json["time"], "09:00");
        assert_eq!(json["durationHours"], 3);
        assert_eq!(json["derivedPrice"], 60);
        assert_eq!(json["submittedAt"], "2026-10-18T08:30:15.123456789Z");

        let decoded: PendingBookingRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }
}
