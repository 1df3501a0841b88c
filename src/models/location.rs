use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only driver position sample, written while a ride is in progress.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RideLocation {
    pub id: i64, // bigserial
    pub ride_id: Uuid,
    pub driver_latitude: f64,
    pub driver_longitude: f64,
    pub timestamp: NaiveDateTime,
}
