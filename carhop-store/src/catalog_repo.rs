use async_trait::async_trait;
use carhop_catalog::{CatalogError, CatalogProvider, Vehicle, VehicleCategory};
use sqlx::PgPool;
use uuid::Uuid;

/// Vehicle catalog backed by the `cars` table
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CarRow {
    id: Uuid,
    name: String,
    category: String,
    seats: i32,
    hourly_rate: i32,
    image_url: Option<String>,
}

impl TryFrom<CarRow> for Vehicle {
    type Error = CatalogError;

    fn try_from(row: CarRow) -> Result<Self, Self::Error> {
        let seats = u32::try_from(row.seats)
            .map_err(|_| CatalogError::Corrupt(format!("car {} has {} seats", row.id, row.seats)))?;
        if row.hourly_rate < 0 {
            return Err(CatalogError::Corrupt(format!(
                "car {} has negative hourly rate {}",
                row.id, row.hourly_rate
            )));
        }
        Ok(Vehicle {
            id: row.id,
            name: row.name,
            category: VehicleCategory::from_label(&row.category),
            seats,
            hourly_rate: row.hourly_rate,
            image_url: row.image_url,
        })
    }
}

const CAR_COLUMNS: &str = "id, name, category, seats, hourly_rate, image_url";

#[async_trait]
impl CatalogProvider for PostgresCatalog {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CatalogError> {
        let rows: Vec<CarRow> =
            sqlx::query_as(&format!("SELECT {} FROM cars ORDER BY name, id", CAR_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, CatalogError> {
        let row: Option<CarRow> =
            sqlx::query_as(&format!("SELECT {} FROM cars WHERE id = $1", CAR_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        row.map(Vehicle::try_from).transpose()
    }
}
