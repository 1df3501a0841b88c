//! Ride dispatch workflows: creation, the claim race, and lifecycle
//! transitions. All mutations go through the store's conditional updates and
//! publish to the notification bus only after commit.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::{require_user, IdentityProvider};
use crate::error::RideError;
use crate::fare;
use crate::geo::Coordinates;
use crate::lifecycle;
use crate::models::{PaymentStatus, Ride, RideCategory, RideStatus};
use crate::notify::NotificationBus;
use crate::retry::{with_backoff, BackoffPolicy};
use crate::store::{NewRide, RideStore};

#[derive(Debug, Clone)]
pub struct CreateRideRequest {
    pub pickup_address: String,
    pub pickup: Coordinates,
    pub destination_address: String,
    pub destination: Coordinates,
    pub ride_type: RideCategory,
    pub scheduled_time: Option<chrono::NaiveDateTime>,
    pub notes: Option<String>,
}

impl CreateRideRequest {
    fn validate(&self) -> Result<(), RideError> {
        let mut missing = Vec::new();
        if self.pickup_address.trim().is_empty() {
            missing.push("pickup_address".to_string());
        }
        if self.destination_address.trim().is_empty() {
            missing.push("destination_address".to_string());
        }
        if !coordinate_in_range(self.pickup) {
            missing.push("pickup coordinates".to_string());
        }
        if !coordinate_in_range(self.destination) {
            missing.push("destination coordinates".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RideError::Validation(missing))
        }
    }
}

fn coordinate_in_range(c: Coordinates) -> bool {
    c.latitude.is_finite()
        && c.longitude.is_finite()
        && (-90.0..=90.0).contains(&c.latitude)
        && (-180.0..=180.0).contains(&c.longitude)
}

pub struct DispatchService {
    store: Arc<dyn RideStore>,
    bus: Arc<NotificationBus>,
    identity: Arc<dyn IdentityProvider>,
    backoff: BackoffPolicy,
}

impl DispatchService {
    pub fn new(
        store: Arc<dyn RideStore>,
        bus: Arc<NotificationBus>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            bus,
            identity,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Creates a `requested` ride owned by the calling rider. The fare is
    /// quoted from the straight-line distance at creation and frozen; paid
    /// categories start with payment pending.
    pub async fn create_ride(&self, request: CreateRideRequest) -> Result<Ride, RideError> {
        let rider_id = require_user(self.identity.as_ref())?;
        request.validate()?;

        let fare_amount =
            fare::calculate_fare(request.ride_type, request.pickup, request.destination);
        let payment_status = request
            .ride_type
            .is_paid()
            .then_some(PaymentStatus::Pending);

        let ride = self
            .store
            .insert_ride(NewRide {
                rider_id,
                pickup_address: request.pickup_address.trim().to_string(),
                pickup_latitude: request.pickup.latitude,
                pickup_longitude: request.pickup.longitude,
                destination_address: request.destination_address.trim().to_string(),
                destination_latitude: request.destination.latitude,
                destination_longitude: request.destination.longitude,
                ride_type: request.ride_type,
                scheduled_time: request.scheduled_time,
                fare_amount,
                payment_status,
                notes: request.notes,
            })
            .await?;

        info!(ride_id = %ride.id, ride_type = ?ride.ride_type, "Ride created");
        self.bus.ride_updated(&ride);
        self.bus.available_rides_changed();
        Ok(ride)
    }

    pub async fn ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        self.store
            .ride(ride_id)
            .await?
            .ok_or_else(|| RideError::not_found("ride", ride_id))
    }

    /// Ride history for the calling user, newest first.
    pub async fn user_rides(&self) -> Result<Vec<Ride>, RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        self.store.rides_for_user(user_id).await
    }

    /// Open requests in FIFO order, retried through transient storage faults.
    pub async fn available_rides(&self) -> Result<Vec<Ride>, RideError> {
        let store = Arc::clone(&self.store);
        with_backoff(self.backoff, "available rides query", move || {
            let store = Arc::clone(&store);
            async move { store.available_rides().await }
        })
        .await
    }

    /// Claims a ride for the calling driver. Exactly one concurrent claimer
    /// wins; the rest get `ClaimConflict` and should refresh the list.
    pub async fn claim(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        let driver_id = require_user(self.identity.as_ref())?;
        let ride = self.store.claim_ride(ride_id, driver_id).await?;

        info!(ride_id = %ride.id, driver_id = %driver_id, "Ride claimed");
        self.bus.ride_updated(&ride);
        self.bus.available_rides_changed();
        Ok(ride)
    }

    pub async fn start_ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        self.update_status(ride_id, RideStatus::InProgress).await
    }

    pub async fn complete_ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        self.update_status(ride_id, RideStatus::Completed).await
    }

    pub async fn cancel_ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        self.update_status(ride_id, RideStatus::Cancelled).await
    }

    /// Moves a ride along the lifecycle. `accepted` is reserved for `claim`
    /// and `emergency` for escalation; both are rejected here regardless of
    /// the current state.
    pub async fn update_status(&self, ride_id: Uuid, to: RideStatus) -> Result<Ride, RideError> {
        require_user(self.identity.as_ref())?;
        let current = self.ride(ride_id).await?;

        if matches!(to, RideStatus::Accepted | RideStatus::Emergency) {
            return Err(RideError::IllegalTransition {
                from: current.status,
                to,
            });
        }
        lifecycle::ensure_transition(current.status, to)?;

        // Conditional on the status we just read; a concurrent writer makes
        // this come back IllegalTransition instead of clobbering their write.
        let updated = self.store.transition_ride(ride_id, current.status, to).await?;

        if updated.status == RideStatus::Completed {
            if let Some(driver_id) = updated.driver_id {
                self.store
                    .record_completed_ride(driver_id, updated.fare_amount)
                    .await?;
            }
        }

        info!(ride_id = %updated.id, from = ?current.status, to = ?updated.status, "Ride status updated");
        self.bus.ride_updated(&updated);
        if current.status == RideStatus::Requested && to == RideStatus::Cancelled {
            // The request just left the open pool.
            self.bus.available_rides_changed();
        }
        Ok(updated)
    }

    /// Records the payment outcome reported by the gateway. Volunteer rides
    /// are free and never carry a payment status.
    pub async fn record_payment(
        &self,
        ride_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Ride, RideError> {
        require_user(self.identity.as_ref())?;
        let current = self.ride(ride_id).await?;
        if !current.ride_type.is_paid() {
            return Err(RideError::Validation(vec!["payment_status".to_string()]));
        }
        let ride = self.store.set_payment_status(ride_id, status).await?;
        self.bus.ride_updated(&ride);
        Ok(ride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Anonymous, FixedIdentity};
    use crate::notify::{Notification, Topic};
    use crate::store::MemoryStore;

    fn coords(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    fn request(ride_type: RideCategory) -> CreateRideRequest {
        CreateRideRequest {
            pickup_address: "10065 Jasper Ave".to_string(),
            pickup: coords(53.5403, -113.4938),
            destination_address: "8882 170 St NW".to_string(),
            destination: coords(53.5225, -113.6242),
            ride_type,
            scheduled_time: None,
            notes: None,
        }
    }

    fn service_for(store: Arc<MemoryStore>, bus: Arc<NotificationBus>, user: Uuid) -> DispatchService {
        DispatchService::new(store, bus, Arc::new(FixedIdentity(user)))
    }

    #[tokio::test]
    async fn create_requires_authentication() {
        let service = DispatchService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NotificationBus::new()),
            Arc::new(Anonymous),
        );
        let result = service.create_ride(request(RideCategory::Weekday)).await;
        assert!(matches!(result, Err(RideError::Unauthenticated)));
    }

    #[tokio::test]
    async fn create_rejects_blank_addresses_and_bad_coordinates() {
        let service = service_for(
            Arc::new(MemoryStore::new()),
            Arc::new(NotificationBus::new()),
            Uuid::new_v4(),
        );

        let mut bad = request(RideCategory::Weekday);
        bad.pickup_address = "   ".to_string();
        bad.destination.latitude = 123.0;

        match service.create_ride(bad).await {
            Err(RideError::Validation(fields)) => {
                assert_eq!(
                    fields,
                    vec![
                        "pickup_address".to_string(),
                        "destination coordinates".to_string()
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_quotes_fare_and_marks_payment_pending() {
        let service = service_for(
            Arc::new(MemoryStore::new()),
            Arc::new(NotificationBus::new()),
            Uuid::new_v4(),
        );

        let ride = service
            .create_ride(request(RideCategory::Weekday))
            .await
            .unwrap();
        assert_eq!(ride.status, RideStatus::Requested);
        assert_eq!(ride.payment_status, Some(PaymentStatus::Pending));
        let fare = ride.fare_amount.unwrap();
        assert!(fare > 5.0, "distance-based fare should exceed the base: {fare}");

        // The frozen quote matches the stored endpoints.
        assert_eq!(
            ride.fare_amount,
            fare::calculate_fare(ride.ride_type, ride.pickup(), ride.destination())
        );

        let volunteer = service
            .create_ride(request(RideCategory::Volunteer))
            .await
            .unwrap();
        assert_eq!(volunteer.fare_amount, None);
        assert_eq!(volunteer.payment_status, None);
    }

    #[tokio::test]
    async fn claim_publishes_to_both_topics() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());
        let driver_id = Uuid::new_v4();
        let driver = service_for(Arc::clone(&store), Arc::clone(&bus), driver_id);

        let ride = rider.create_ride(request(RideCategory::Weekday)).await.unwrap();

        let mut ride_sub = bus.subscribe(Topic::Ride(ride.id));
        let mut list_sub = bus.subscribe(Topic::AvailableRides);

        let claimed = driver.claim(ride.id).await.unwrap();
        assert_eq!(claimed.status, RideStatus::Accepted);
        assert_eq!(claimed.driver_id, Some(driver_id));

        match ride_sub.recv().await {
            Some(Notification::RideUpdated(updated)) => {
                assert_eq!(updated.driver_id, Some(driver_id));
            }
            other => panic!("expected ride update, got {other:?}"),
        }
        assert!(matches!(
            list_sub.recv().await,
            Some(Notification::AvailableRidesChanged)
        ));
    }

    #[tokio::test]
    async fn second_claim_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());
        let first = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());
        let second = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());

        let ride = rider.create_ride(request(RideCategory::DriveBack)).await.unwrap();
        first.claim(ride.id).await.unwrap();

        assert!(matches!(
            second.claim(ride.id).await,
            Err(RideError::ClaimConflict)
        ));
    }

    #[tokio::test]
    async fn accepted_and_emergency_are_not_reachable_via_update_status() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let service = service_for(Arc::clone(&store), bus, Uuid::new_v4());

        let ride = service.create_ride(request(RideCategory::Weekday)).await.unwrap();

        for target in [RideStatus::Accepted, RideStatus::Emergency] {
            match service.update_status(ride.id, target).await {
                Err(RideError::IllegalTransition { from, to }) => {
                    assert_eq!(from, RideStatus::Requested);
                    assert_eq!(to, target);
                }
                other => panic!("expected illegal transition, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn completion_stamps_times_and_rolls_up_driver_stats() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());
        let driver_id = Uuid::new_v4();
        let driver = service_for(Arc::clone(&store), Arc::clone(&bus), driver_id);

        store.upsert_driver(driver_id).await.unwrap();

        let ride = rider.create_ride(request(RideCategory::Weekday)).await.unwrap();
        let fare = ride.fare_amount.unwrap();

        driver.claim(ride.id).await.unwrap();
        let started = driver.start_ride(ride.id).await.unwrap();
        assert!(started.started_at.is_some());

        let completed = driver.complete_ride(ride.id).await.unwrap();
        assert_eq!(completed.status, RideStatus::Completed);
        assert!(completed.completed_at.is_some());

        let profile = store.driver(driver_id).await.unwrap().unwrap();
        assert_eq!(profile.total_rides, 1);
        assert!((profile.total_earnings - fare).abs() < 1e-9);
    }

    #[tokio::test]
    async fn cancelling_an_open_request_signals_the_pool() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), Arc::clone(&bus), Uuid::new_v4());

        let ride = rider.create_ride(request(RideCategory::Volunteer)).await.unwrap();
        let mut list_sub = bus.subscribe(Topic::AvailableRides);

        let cancelled = rider.cancel_ride(ride.id).await.unwrap();
        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert!(matches!(
            list_sub.recv().await,
            Some(Notification::AvailableRidesChanged)
        ));

        // Terminal; no further transitions.
        assert!(rider.start_ride(ride.id).await.is_err());
    }

    #[tokio::test]
    async fn record_payment_updates_the_ride() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), bus, Uuid::new_v4());

        let ride = rider.create_ride(request(RideCategory::Weekday)).await.unwrap();
        let paid = rider.record_payment(ride.id, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn payment_cannot_be_recorded_on_a_volunteer_ride() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(NotificationBus::new());
        let rider = service_for(Arc::clone(&store), bus, Uuid::new_v4());

        let ride = rider
            .create_ride(request(RideCategory::Volunteer))
            .await
            .unwrap();

        match rider.record_payment(ride.id, PaymentStatus::Paid).await {
            Err(RideError::Validation(fields)) => {
                assert_eq!(fields, vec!["payment_status".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // The free ride stays free.
        let stored = store.ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, None);
    }
}
