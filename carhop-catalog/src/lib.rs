pub mod vehicle;
pub mod pricing;
pub mod provider;

pub use vehicle::{Vehicle, VehicleCategory};
pub use pricing::{quote, PricingError, MAX_DURATION_HOURS, MIN_DURATION_HOURS};
pub use provider::{CatalogError, CatalogProvider, InMemoryCatalog};
