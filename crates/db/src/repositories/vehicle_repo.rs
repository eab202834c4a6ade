//! Repository for the `vehicles` table.

use bayline_core::types::DbId;
use sqlx::PgPool;

use crate::models::identity::{CreateVehicle, Vehicle};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, plate_number, make, model, created_at, updated_at";

pub struct VehicleRepo;

impl VehicleRepo {
    /// Insert a new vehicle, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateVehicle) -> Result<Vehicle, sqlx::Error> {
        let query = format!(
            "INSERT INTO vehicles (owner_id, plate_number, make, model)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(input.owner_id)
            .bind(&input.plate_number)
            .bind(&input.make)
            .bind(&input.model)
            .fetch_one(pool)
            .await
    }

    /// Find a vehicle by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
