use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Steps of the booking wizard, in the only order they can be visited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStep {
    SelectingVehicle,
    EnteringLocation,
    SelectingDateTime,
    Confirming,
    Submitted,
}

impl WizardStep {
    /// Step reached by a successful `advance()`. `Confirming` only leaves through `submit()`.
    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::SelectingVehicle => Some(WizardStep::EnteringLocation),
            WizardStep::EnteringLocation => Some(WizardStep::SelectingDateTime),
            WizardStep::SelectingDateTime => Some(WizardStep::Confirming),
            WizardStep::Confirming | WizardStep::Submitted => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::SelectingVehicle | WizardStep::Submitted => None,
            WizardStep::EnteringLocation => Some(WizardStep::SelectingVehicle),
            WizardStep::SelectingDateTime => Some(WizardStep::EnteringLocation),
            WizardStep::Confirming => Some(WizardStep::SelectingDateTime),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStep::Submitted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::SelectingVehicle => "SELECTING_VEHICLE",
            WizardStep::EnteringLocation => "ENTERING_LOCATION",
            WizardStep::SelectingDateTime => "SELECTING_DATE_TIME",
            WizardStep::Confirming => "CONFIRMING",
            WizardStep::Submitted => "SUBMITTED",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-editable draft fields, named the way the UI and the persisted record name them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    VehicleId,
    PickupLocation,
    DropoffLocation,
    Date,
    Time,
    DurationHours,
}

impl DraftField {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::VehicleId => "vehicleId",
            DraftField::PickupLocation => "pickupLocation",
            DraftField::DropoffLocation => "dropoffLocation",
            DraftField::Date => "date",
            DraftField::Time => "time",
            DraftField::DurationHours => "durationHours",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-hour pickup slot, 00:00 through 23:00. Serialized as `"HH:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HourSlot(u8);

impl HourSlot {
    pub fn new(hour: u8) -> Result<Self, HourSlotError> {
        if hour > 23 {
            return Err(HourSlotError::OutOfRange(hour));
        }
        Ok(Self(hour))
    }

    pub fn hour(self) -> u8 {
        self.0
    }
}

impl fmt::Display for HourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for HourSlot {
    type Err = HourSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| HourSlotError::Malformed(s.to_string()))?;
        if minute != "00" {
            return Err(HourSlotError::NotOnTheHour(s.to_string()));
        }
        let hour: u8 = hour
            .parse()
            .map_err(|_| HourSlotError::Malformed(s.to_string()))?;
        Self::new(hour)
    }
}

impl TryFrom<String> for HourSlot {
    type Error = HourSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HourSlot> for String {
    fn from(slot: HourSlot) -> Self {
        slot.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HourSlotError {
    #[error("Hour slot must be between 00:00 and 23:00, got hour {0}")]
    OutOfRange(u8),

    #[error("Hour slot must fall on the hour: {0}")]
    NotOnTheHour(String),

    #[error("Malformed hour slot: {0}")]
    Malformed(String),
}

/// The in-progress reservation collected by the wizard.
///
/// Fields are recorded as the user enters them; the wizard decides when they are good enough to
/// move on. The price is never stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub vehicle_id: Option<Uuid>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub date: Option<NaiveDate>,
    pub time: Option<HourSlot>,
    pub duration_hours: Option<u32>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }
}
