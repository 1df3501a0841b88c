//! Storage boundary for the dispatch core.
//!
//! Every conditional mutation (claim, transition, escalation) is atomic at
//! this boundary: implementations must never read state into the application
//! tier and write it back unconditionally.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::RideError;
use crate::models::{
    DispatchStatus, DriverInfo, EmergencyContact, PaymentStatus, Ride, RideCategory, RideLocation,
    RideStatus, SosAlert,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct NewRide {
    pub rider_id: Uuid,
    pub pickup_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub destination_address: String,
    pub destination_latitude: f64,
    pub destination_longitude: f64,
    pub ride_type: RideCategory,
    pub scheduled_time: Option<NaiveDateTime>,
    pub fare_amount: Option<f64>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub relationship: String,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub struct NewRideLocation {
    pub ride_id: Uuid,
    pub driver_latitude: f64,
    pub driver_longitude: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct Availability {
    pub is_available: bool,
    pub volunteer: bool,
    pub weekday: bool,
}

#[derive(Debug, Clone)]
pub struct NewSosAlert {
    pub ride_id: Option<Uuid>,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait RideStore: Send + Sync {
    async fn insert_ride(&self, new: NewRide) -> Result<Ride, RideError>;

    async fn ride(&self, id: Uuid) -> Result<Option<Ride>, RideError>;

    /// Rides where the user is rider or driver, newest first.
    async fn rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RideError>;

    /// Unclaimed `requested` rides, oldest first (strict FIFO).
    async fn available_rides(&self) -> Result<Vec<Ride>, RideError>;

    /// Atomically assigns the driver iff the ride is still `requested` and
    /// unclaimed. `ClaimConflict` when the compare fails, `NotFound` when the
    /// ride does not exist. Never partially mutates.
    async fn claim_ride(&self, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, RideError>;

    /// Conditional transition keyed on the expected prior status. Stamps
    /// `started_at`/`completed_at` on entry into `in_progress`/`completed`.
    async fn transition_ride(
        &self,
        ride_id: Uuid,
        from: RideStatus,
        to: RideStatus,
    ) -> Result<Ride, RideError>;

    /// Force-transition to `emergency` from any non-terminal state.
    async fn escalate_ride(&self, ride_id: Uuid) -> Result<Ride, RideError>;

    async fn set_payment_status(
        &self,
        ride_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Ride, RideError>;

    /// Creates the driver profile on first call; later calls are no-ops
    /// returning the existing row.
    async fn upsert_driver(&self, user_id: Uuid) -> Result<DriverInfo, RideError>;

    async fn driver(&self, user_id: Uuid) -> Result<Option<DriverInfo>, RideError>;

    async fn set_driver_availability(
        &self,
        user_id: Uuid,
        availability: Availability,
    ) -> Result<DriverInfo, RideError>;

    /// Rolls a completed ride into the driver's totals.
    async fn record_completed_ride(
        &self,
        driver_id: Uuid,
        fare: Option<f64>,
    ) -> Result<(), RideError>;

    async fn add_contact(&self, new: NewContact) -> Result<EmergencyContact, RideError>;

    /// Contacts for a user, ascending priority (first to notify first).
    async fn contacts_for_user(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>, RideError>;

    async fn remove_contact(&self, user_id: Uuid, contact_id: Uuid) -> Result<(), RideError>;

    /// Append-only; concurrent pings need no coordination.
    async fn append_location(&self, ping: NewRideLocation) -> Result<(), RideError>;

    /// Trail for a ride ordered by timestamp.
    async fn locations_for_ride(&self, ride_id: Uuid) -> Result<Vec<RideLocation>, RideError>;

    async fn insert_sos(&self, new: NewSosAlert) -> Result<SosAlert, RideError>;

    async fn sos_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>, RideError>;

    async fn set_sos_dispatch_status(
        &self,
        alert_id: Uuid,
        status: DispatchStatus,
    ) -> Result<(), RideError>;
}
