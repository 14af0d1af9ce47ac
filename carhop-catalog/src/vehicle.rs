use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle classes offered on the booking site
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    Economy,
    Compact,
    Sedan,
    Suv,
    Van,
    Luxury,
    #[serde(other)]
    Other,
}

impl VehicleCategory {
    /// Parse the free-form labels operators type into the admin console ("SUV", "sedan", ...)
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "economy" => VehicleCategory::Economy,
            "compact" => VehicleCategory::Compact,
            "sedan" => VehicleCategory::Sedan,
            "suv" => VehicleCategory::Suv,
            "van" | "minivan" => VehicleCategory::Van,
            "luxury" => VehicleCategory::Luxury,
            _ => VehicleCategory::Other,
        }
    }
}

/// A rentable vehicle. Read-only from the booking flow's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub category: VehicleCategory,
    pub seats: u32,
    /// Price per rental hour, whole currency units
    pub hourly_rate: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, category: VehicleCategory, seats: u32, hourly_rate: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            seats,
            hourly_rate,
            image_url: None,
        }
    }
}
