use carhop_catalog::{quote, CatalogProvider, PricingError, Vehicle, MAX_DURATION_HOURS, MIN_DURATION_HOURS};
use carhop_core::{
    BookingDraft, BookingError, BookingResult, Clock, DraftField, HourSlot, PendingBookingRecord,
    WizardStep,
};
use carhop_shared::Masked;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::submission::{BookingSubmitter, SubmitOutcome};

/// Drives one booking from vehicle selection to submission.
///
/// The wizard is the only place that decides whether a step is complete. Setters record what the
/// user entered; `advance()` refuses to move on until the current step's fields are valid, and
/// `submit()` checks the whole draft once more before freezing it.
///
/// The draft is frozen on the first submit attempt and the same record id is resent on every
/// retry, so a write that landed remotely despite a timeout is not booked twice. Going back to
/// edit discards the frozen record.
pub struct BookingWizard {
    id: Uuid,
    step: WizardStep,
    draft: BookingDraft,
    vehicle: Option<Vehicle>,
    frozen: Option<PendingBookingRecord>,
    catalog: Arc<dyn CatalogProvider>,
    clock: Arc<dyn Clock>,
    created_at: DateTime<Utc>,
}

/// Read-only view of a wizard for the UI layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub id: Uuid,
    pub step: WizardStep,
    pub draft: BookingDraft,
    pub vehicle: Option<Vehicle>,
    pub derived_price: Option<i32>,
    pub can_advance: bool,
    pub submitted: Option<PendingBookingRecord>,
    pub created_at: DateTime<Utc>,
}

impl BookingWizard {
    pub fn new(catalog: Arc<dyn CatalogProvider>, clock: Arc<dyn Clock>) -> Self {
        let created_at = clock.now();
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::SelectingVehicle,
            draft: BookingDraft::new(),
            vehicle: None,
            frozen: None,
            catalog,
            clock,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the booking was captured, once the wizard has reached `Submitted`
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        match self.step {
            WizardStep::Submitted => self.frozen.as_ref().map(|r| r.submitted_at),
            _ => None,
        }
    }

    /// Step 1: pick a vehicle from the catalog
    pub async fn select_vehicle(&mut self, vehicle_id: Uuid) -> BookingResult<()> {
        self.ensure_editing(WizardStep::SelectingVehicle, "select a vehicle")?;

        let vehicle = self
            .catalog
            .get_vehicle(vehicle_id)
            .await
            .map_err(|e| BookingError::Catalog(e.to_string()))?
            .ok_or_else(|| {
                BookingError::validation(
                    DraftField::VehicleId,
                    format!("unknown vehicle {}", vehicle_id),
                )
            })?;

        debug!(wizard = %self.id, vehicle = %vehicle.id, "Vehicle selected");
        self.draft.vehicle_id = Some(vehicle.id);
        self.vehicle = Some(vehicle);
        Ok(())
    }

    /// Step 2: pickup and dropoff locations
    pub fn set_locations(
        &mut self,
        pickup: impl Into<String>,
        dropoff: impl Into<String>,
    ) -> BookingResult<()> {
        self.ensure_editing(WizardStep::EnteringLocation, "edit locations")?;
        self.draft.pickup_location = pickup.into();
        self.draft.dropoff_location = dropoff.into();
        debug!(
            wizard = %self.id,
            pickup = %Masked(&self.draft.pickup_location),
            dropoff = %Masked(&self.draft.dropoff_location),
            "Locations updated"
        );
        Ok(())
    }

    /// Step 3: date, pickup hour and rental length
    pub fn set_schedule(
        &mut self,
        date: Option<NaiveDate>,
        time: Option<HourSlot>,
        duration_hours: Option<u32>,
    ) -> BookingResult<()> {
        self.ensure_editing(WizardStep::SelectingDateTime, "edit the schedule")?;
        self.draft.date = date;
        self.draft.time = time;
        self.draft.duration_hours = duration_hours;
        Ok(())
    }

    /// Current price, recomputed from the selected vehicle's rate and the duration on every call
    pub fn derived_price(&self) -> Option<i32> {
        let vehicle = self.vehicle.as_ref()?;
        let hours = self.draft.duration_hours?;
        quote(vehicle.hourly_rate, hours).ok()
    }

    /// Move to the next step if the current one is complete
    pub fn advance(&mut self) -> BookingResult<WizardStep> {
        let next = self.step.next().ok_or(BookingError::InvalidTransition {
            from: self.step,
            action: "advance",
        })?;
        self.check_step(self.step)?;

        info!(wizard = %self.id, from = %self.step, to = %next, "Wizard advanced");
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Entered data is kept.
    pub fn retreat(&mut self) -> BookingResult<WizardStep> {
        let previous = self.step.previous().ok_or(BookingError::InvalidTransition {
            from: self.step,
            action: "go back",
        })?;

        if let Some(record) = self.frozen.take() {
            debug!(wizard = %self.id, record_id = %record.id, "Frozen record discarded for editing");
        }
        info!(wizard = %self.id, from = %self.step, to = %previous, "Wizard retreated");
        self.step = previous;
        Ok(previous)
    }

    /// Freeze the confirmed draft and hand it to the submitter.
    ///
    /// Moves to `Submitted` on confirmation or on offline capture; any error leaves the wizard in
    /// `Confirming` so the user can retry.
    pub async fn submit(&mut self, submitter: &BookingSubmitter) -> BookingResult<SubmitOutcome> {
        if self.step != WizardStep::Confirming {
            return Err(BookingError::InvalidTransition {
                from: self.step,
                action: "submit",
            });
        }
        for step in [
            WizardStep::SelectingVehicle,
            WizardStep::EnteringLocation,
            WizardStep::SelectingDateTime,
        ] {
            self.check_step(step)?;
        }

        let record = match self.frozen.clone() {
            Some(record) => {
                debug!(wizard = %self.id, record_id = %record.id, "Resubmitting frozen record");
                record
            }
            None => {
                let price = self.require_price()?;
                let record = PendingBookingRecord::freeze(&self.draft, price, self.clock.now())?;
                self.frozen = Some(record.clone());
                record
            }
        };
        let outcome = submitter.submit(&record).await?;

        info!(wizard = %self.id, record_id = %record.id, queued = outcome.is_queued(), "Booking submitted");
        self.step = WizardStep::Submitted;
        Ok(outcome)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            id: self.id,
            step: self.step,
            draft: self.draft.clone(),
            vehicle: self.vehicle.clone(),
            derived_price: self.derived_price(),
            can_advance: self.step.next().is_some() && self.check_step(self.step).is_ok(),
            submitted: self.submitted_at().and(self.frozen.clone()),
            created_at: self.created_at,
        }
    }

    fn ensure_editing(&self, owner: WizardStep, action: &'static str) -> BookingResult<()> {
        if self.step != owner {
            return Err(BookingError::InvalidTransition {
                from: self.step,
                action,
            });
        }
        Ok(())
    }

    /// Required fields for leaving `step`
    fn check_step(&self, step: WizardStep) -> BookingResult<()> {
        match step {
            WizardStep::SelectingVehicle => match (&self.draft.vehicle_id, &self.vehicle) {
                (Some(id), Some(vehicle)) if *id == vehicle.id => Ok(()),
                _ => Err(BookingError::validation(DraftField::VehicleId, "select a vehicle")),
            },
            WizardStep::EnteringLocation => {
                if self.draft.pickup_location.trim().is_empty() {
                    return Err(BookingError::validation(DraftField::PickupLocation, "required"));
                }
                if self.draft.dropoff_location.trim().is_empty() {
                    return Err(BookingError::validation(DraftField::DropoffLocation, "required"));
                }
                Ok(())
            }
            WizardStep::SelectingDateTime => {
                let date = self
                    .draft
                    .date
                    .ok_or_else(|| BookingError::validation(DraftField::Date, "required"))?;
                if date < self.clock.today() {
                    return Err(BookingError::validation(
                        DraftField::Date,
                        "must not be in the past",
                    ));
                }
                if self.draft.time.is_none() {
                    return Err(BookingError::validation(DraftField::Time, "required"));
                }
                let hours = self
                    .draft
                    .duration_hours
                    .ok_or_else(|| BookingError::validation(DraftField::DurationHours, "required"))?;
                if !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&hours) {
                    return Err(BookingError::validation(
                        DraftField::DurationHours,
                        format!(
                            "must be between {} and {} hours",
                            MIN_DURATION_HOURS, MAX_DURATION_HOURS
                        ),
                    ));
                }
                Ok(())
            }
            WizardStep::Confirming | WizardStep::Submitted => Ok(()),
        }
    }

    fn require_price(&self) -> BookingResult<i32> {
        let vehicle = self
            .vehicle
            .as_ref()
            .ok_or_else(|| BookingError::validation(DraftField::VehicleId, "select a vehicle"))?;
        let hours = self
            .draft
            .duration_hours
            .ok_or_else(|| BookingError::validation(DraftField::DurationHours, "required"))?;
        quote(vehicle.hourly_rate, hours).map_err(|e| match e {
            PricingError::NegativeRate(_) => {
                BookingError::validation(DraftField::VehicleId, e.to_string())
            }
            PricingError::DurationOutOfRange(_) | PricingError::Overflow { .. } => {
                BookingError::validation(DraftField::DurationHours, e.to_string())
            }
        })
    }
}
