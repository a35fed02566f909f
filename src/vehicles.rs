use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::fees::models::{parse_money, Money};

/// A vehicle listed for bidding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Money,
    #[serde(rename = "type")]
    pub vehicle_type: String,
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    name: String,
    price: String,
    vehicle_type: String,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let price = parse_money(&row.price).ok_or_else(|| {
            AppError::InternalError(format!("Invalid price '{}' for vehicle {}", row.price, row.id))
        })?;

        Ok(Vehicle {
            id: row.id,
            name: row.name,
            price,
            vehicle_type: row.vehicle_type,
        })
    }
}

/// Read access to the vehicle catalogue
#[derive(Clone)]
pub struct VehicleRepository {
    db_pool: SqlitePool,
}

impl VehicleRepository {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// All vehicles ordered by id
    pub async fn list_all(&self) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT v.id, v.name, CAST(v.price AS TEXT) AS price, vt.name AS vehicle_type
            FROM vehicles AS v
            JOIN vehicle_types AS vt ON v.vehicle_type_id = vt.id
            ORDER BY v.id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Database error: {}", e)))?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT v.id, v.name, CAST(v.price AS TEXT) AS price, vt.name AS vehicle_type
            FROM vehicles AS v
            JOIN vehicle_types AS vt ON v.vehicle_type_id = vt.id
            WHERE v.id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Database error: {}", e)))?;

        row.map(Vehicle::try_from).transpose()
    }
}
