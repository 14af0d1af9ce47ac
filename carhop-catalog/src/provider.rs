use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::vehicle::Vehicle;

/// Read-only source of rentable vehicles
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CatalogError>;

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, CatalogError>;
}

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog entry is malformed: {0}")]
    Corrupt(String),
}

/// In-memory catalog, used when no database is configured and in tests
pub struct InMemoryCatalog {
    order: Vec<Uuid>,
    vehicles: HashMap<Uuid, Vehicle>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            vehicles: HashMap::new(),
        }
    }

    /// Add or replace a vehicle. Listing keeps first-insertion order.
    pub fn insert(&mut self, vehicle: Vehicle) {
        if !self.vehicles.contains_key(&vehicle.id) {
            self.order.push(vehicle.id);
        }
        self.vehicles.insert(vehicle.id, vehicle);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Vehicle> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Vehicle>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for vehicle in iter {
            catalog.insert(vehicle);
        }
        catalog
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CatalogError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.vehicles.get(id))
            .cloned()
            .collect())
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, CatalogError> {
        Ok(self.vehicles.get(&id).cloned())
    }
}
