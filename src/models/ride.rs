use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::geo::Coordinates;

/// Service class of a ride. Volunteer rides are free; the other two are paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ride_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RideCategory {
    Volunteer,
    Weekday,
    DriveBack,
}

impl RideCategory {
    pub fn is_paid(self) -> bool {
        !matches!(self, RideCategory::Volunteer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ride_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Requested,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Emergency,
}

/// Outcome reported by the payment gateway. Only meaningful for paid categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// One transportation request, from creation to a terminal state.
///
/// `driver_id` is set exactly once, by a successful claim, and never changes
/// afterwards. `started_at`/`completed_at` are stamped by the transitions into
/// `in_progress` and `completed` respectively.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ride {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub destination_address: String,
    pub destination_latitude: f64,
    pub destination_longitude: f64,
    pub ride_type: RideCategory,
    pub status: RideStatus,
    pub scheduled_time: Option<NaiveDateTime>,
    pub fare_amount: Option<f64>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

impl Ride {
    pub fn pickup(&self) -> Coordinates {
        Coordinates {
            latitude: self.pickup_latitude,
            longitude: self.pickup_longitude,
        }
    }

    pub fn destination(&self) -> Coordinates {
        Coordinates {
            latitude: self.destination_latitude,
            longitude: self.destination_longitude,
        }
    }
}
