use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "background_check_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    Pending,
    Approved,
    Rejected,
}

/// Provider profile. Created when a user opts into driving; availability is
/// driver-controlled, totals and rating are system-maintained.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DriverInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_color: Option<String>,
    pub license_plate: Option<String>,
    pub drivers_license_number: Option<String>,
    pub verification_status: VerificationStatus,
    pub background_check_status: BackgroundCheckStatus,
    pub is_available: bool,
    pub availability_volunteer: bool,
    pub availability_weekday: bool,
    pub total_earnings: f64,
    pub total_rides: i32,
    pub rating: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
