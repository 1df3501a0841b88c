//! In-memory store for tests and local development.
//!
//! A single mutex guards all state, so every conditional mutation is the same
//! check-and-set the Postgres store performs in one statement: claims are
//! linearizable by construction.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::RideError;
use crate::models::{
    BackgroundCheckStatus, DispatchStatus, DriverInfo, EmergencyContact, PaymentStatus, Ride,
    RideLocation, RideStatus, SosAlert, VerificationStatus,
};
use crate::store::{
    Availability, NewContact, NewRide, NewRideLocation, NewSosAlert, RideStore,
};

#[derive(Default)]
struct Inner {
    rides: HashMap<Uuid, Ride>,
    // Insertion sequence; created_at alone can tie within a test run.
    ride_seq: HashMap<Uuid, u64>,
    next_seq: u64,
    drivers: HashMap<Uuid, DriverInfo>,
    contacts: HashMap<Uuid, EmergencyContact>,
    locations: Vec<RideLocation>,
    next_location_id: i64,
    sos: HashMap<Uuid, SosAlert>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of every recorded SOS alert, in no particular order.
    pub fn sos_alerts(&self) -> Vec<SosAlert> {
        self.lock().sos.values().cloned().collect()
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn insert_ride(&self, new: NewRide) -> Result<Ride, RideError> {
        let now = Utc::now().naive_utc();
        let ride = Ride {
            id: Uuid::new_v4(),
            rider_id: new.rider_id,
            driver_id: None,
            pickup_address: new.pickup_address,
            pickup_latitude: new.pickup_latitude,
            pickup_longitude: new.pickup_longitude,
            destination_address: new.destination_address,
            destination_latitude: new.destination_latitude,
            destination_longitude: new.destination_longitude,
            ride_type: new.ride_type,
            status: RideStatus::Requested,
            scheduled_time: new.scheduled_time,
            fare_amount: new.fare_amount,
            payment_status: new.payment_status,
            notes: new.notes,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };

        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.ride_seq.insert(ride.id, seq);
        inner.rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn ride(&self, id: Uuid) -> Result<Option<Ride>, RideError> {
        Ok(self.lock().rides.get(&id).cloned())
    }

    async fn rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RideError> {
        let inner = self.lock();
        let mut rides: Vec<Ride> = inner
            .rides
            .values()
            .filter(|r| r.rider_id == user_id || r.driver_id == Some(user_id))
            .cloned()
            .collect();
        rides.sort_by_key(|r| std::cmp::Reverse(inner.ride_seq[&r.id]));
        Ok(rides)
    }

    async fn available_rides(&self) -> Result<Vec<Ride>, RideError> {
        let inner = self.lock();
        let mut rides: Vec<Ride> = inner
            .rides
            .values()
            .filter(|r| r.status == RideStatus::Requested && r.driver_id.is_none())
            .cloned()
            .collect();
        rides.sort_by_key(|r| inner.ride_seq[&r.id]);
        Ok(rides)
    }

    async fn claim_ride(&self, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, RideError> {
        let mut inner = self.lock();
        let ride = inner
            .rides
            .get_mut(&ride_id)
            .ok_or_else(|| RideError::not_found("ride", ride_id))?;

        if ride.status != RideStatus::Requested || ride.driver_id.is_some() {
            return Err(RideError::ClaimConflict);
        }

        ride.driver_id = Some(driver_id);
        ride.status = RideStatus::Accepted;
        ride.updated_at = Utc::now().naive_utc();
        Ok(ride.clone())
    }

    async fn transition_ride(
        &self,
        ride_id: Uuid,
        from: RideStatus,
        to: RideStatus,
    ) -> Result<Ride, RideError> {
        let mut inner = self.lock();
        let ride = inner
            .rides
            .get_mut(&ride_id)
            .ok_or_else(|| RideError::not_found("ride", ride_id))?;

        if ride.status != from {
            return Err(RideError::IllegalTransition {
                from: ride.status,
                to,
            });
        }

        let now = Utc::now().naive_utc();
        ride.status = to;
        ride.updated_at = now;
        match to {
            RideStatus::InProgress => ride.started_at = Some(now),
            RideStatus::Completed => ride.completed_at = Some(now),
            _ => {}
        }
        Ok(ride.clone())
    }

    async fn escalate_ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        let mut inner = self.lock();
        let ride = inner
            .rides
            .get_mut(&ride_id)
            .ok_or_else(|| RideError::not_found("ride", ride_id))?;

        if ride.status.is_terminal() {
            return Err(RideError::IllegalTransition {
                from: ride.status,
                to: RideStatus::Emergency,
            });
        }

        ride.status = RideStatus::Emergency;
        ride.updated_at = Utc::now().naive_utc();
        Ok(ride.clone())
    }

    async fn set_payment_status(
        &self,
        ride_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Ride, RideError> {
        let mut inner = self.lock();
        let ride = inner
            .rides
            .get_mut(&ride_id)
            .ok_or_else(|| RideError::not_found("ride", ride_id))?;
        ride.payment_status = Some(status);
        ride.updated_at = Utc::now().naive_utc();
        Ok(ride.clone())
    }

    async fn upsert_driver(&self, user_id: Uuid) -> Result<DriverInfo, RideError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.drivers.get(&user_id) {
            return Ok(existing.clone());
        }
        let now = Utc::now().naive_utc();
        let driver = DriverInfo {
            id: Uuid::new_v4(),
            user_id,
            vehicle_make: None,
            vehicle_model: None,
            vehicle_year: None,
            vehicle_color: None,
            license_plate: None,
            drivers_license_number: None,
            verification_status: VerificationStatus::Pending,
            background_check_status: BackgroundCheckStatus::Pending,
            is_available: false,
            availability_volunteer: false,
            availability_weekday: false,
            total_earnings: 0.0,
            total_rides: 0,
            rating: None,
            created_at: now,
            updated_at: now,
        };
        inner.drivers.insert(user_id, driver.clone());
        Ok(driver)
    }

    async fn driver(&self, user_id: Uuid) -> Result<Option<DriverInfo>, RideError> {
        Ok(self.lock().drivers.get(&user_id).cloned())
    }

    async fn set_driver_availability(
        &self,
        user_id: Uuid,
        availability: Availability,
    ) -> Result<DriverInfo, RideError> {
        let mut inner = self.lock();
        let driver = inner
            .drivers
            .get_mut(&user_id)
            .ok_or_else(|| RideError::not_found("driver", user_id))?;
        driver.is_available = availability.is_available;
        driver.availability_volunteer = availability.volunteer;
        driver.availability_weekday = availability.weekday;
        driver.updated_at = Utc::now().naive_utc();
        Ok(driver.clone())
    }

    async fn record_completed_ride(
        &self,
        driver_id: Uuid,
        fare: Option<f64>,
    ) -> Result<(), RideError> {
        let mut inner = self.lock();
        if let Some(driver) = inner.drivers.get_mut(&driver_id) {
            driver.total_rides += 1;
            driver.total_earnings += fare.unwrap_or(0.0);
            driver.updated_at = Utc::now().naive_utc();
        }
        Ok(())
    }

    async fn add_contact(&self, new: NewContact) -> Result<EmergencyContact, RideError> {
        let now = Utc::now().naive_utc();
        let contact = EmergencyContact {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            phone: new.phone,
            relationship: new.relationship,
            priority: new.priority,
            created_at: now,
            updated_at: now,
        };
        self.lock().contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn contacts_for_user(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>, RideError> {
        let inner = self.lock();
        let mut contacts: Vec<EmergencyContact> = inner
            .contacts
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.priority);
        Ok(contacts)
    }

    async fn remove_contact(&self, user_id: Uuid, contact_id: Uuid) -> Result<(), RideError> {
        let mut inner = self.lock();
        match inner.contacts.get(&contact_id) {
            Some(contact) if contact.user_id == user_id => {
                inner.contacts.remove(&contact_id);
                Ok(())
            }
            _ => Err(RideError::not_found("emergency contact", contact_id)),
        }
    }

    async fn append_location(&self, ping: NewRideLocation) -> Result<(), RideError> {
        let mut inner = self.lock();
        let id = inner.next_location_id;
        inner.next_location_id += 1;
        inner.locations.push(RideLocation {
            id,
            ride_id: ping.ride_id,
            driver_latitude: ping.driver_latitude,
            driver_longitude: ping.driver_longitude,
            timestamp: ping.timestamp,
        });
        Ok(())
    }

    async fn locations_for_ride(&self, ride_id: Uuid) -> Result<Vec<RideLocation>, RideError> {
        let inner = self.lock();
        let mut trail: Vec<RideLocation> = inner
            .locations
            .iter()
            .filter(|l| l.ride_id == ride_id)
            .cloned()
            .collect();
        trail.sort_by_key(|l| l.timestamp);
        Ok(trail)
    }

    async fn insert_sos(&self, new: NewSosAlert) -> Result<SosAlert, RideError> {
        let alert = SosAlert {
            id: Uuid::new_v4(),
            ride_id: new.ride_id,
            user_id: new.user_id,
            latitude: new.latitude,
            longitude: new.longitude,
            triggered_at: Utc::now().naive_utc(),
            dispatch_status: DispatchStatus::Pending,
        };
        self.lock().sos.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn sos_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>, RideError> {
        Ok(self.lock().sos.get(&alert_id).cloned())
    }

    async fn set_sos_dispatch_status(
        &self,
        alert_id: Uuid,
        status: DispatchStatus,
    ) -> Result<(), RideError> {
        let mut inner = self.lock();
        let alert = inner
            .sos
            .get_mut(&alert_id)
            .ok_or_else(|| RideError::not_found("sos alert", alert_id))?;
        alert.dispatch_status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RideCategory;
    use crate::store::NewRide;

    fn new_ride(rider_id: Uuid) -> NewRide {
        NewRide {
            rider_id,
            pickup_address: "10220 104 St NW".into(),
            pickup_latitude: 53.5444,
            pickup_longitude: -113.4989,
            destination_address: "8440 112 St NW".into(),
            destination_latitude: 53.5205,
            destination_longitude: -113.5256,
            ride_type: RideCategory::Weekday,
            scheduled_time: None,
            fare_amount: Some(9.85),
            payment_status: Some(PaymentStatus::Pending),
            notes: None,
        }
    }

    #[tokio::test]
    async fn available_rides_are_fifo_and_exclude_claimed() {
        let store = MemoryStore::new();
        let rider = Uuid::new_v4();
        let first = store.insert_ride(new_ride(rider)).await.unwrap();
        let second = store.insert_ride(new_ride(rider)).await.unwrap();
        let third = store.insert_ride(new_ride(rider)).await.unwrap();

        store.claim_ride(second.id, Uuid::new_v4()).await.unwrap();

        let available = store.available_rides().await.unwrap();
        let ids: Vec<Uuid> = available.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
        for ride in available {
            assert_eq!(ride.status, RideStatus::Requested);
            assert!(ride.driver_id.is_none());
        }
    }

    #[tokio::test]
    async fn failed_claim_leaves_the_record_unchanged() {
        let store = MemoryStore::new();
        let ride = store.insert_ride(new_ride(Uuid::new_v4())).await.unwrap();
        let winner = Uuid::new_v4();

        store.claim_ride(ride.id, winner).await.unwrap();
        let before = store.ride(ride.id).await.unwrap().unwrap();

        let err = store.claim_ride(ride.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RideError::ClaimConflict));

        let after = store.ride(ride.id).await.unwrap().unwrap();
        assert_eq!(after.driver_id, Some(winner));
        assert_eq!(after.status, before.status);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn claiming_a_cancelled_ride_conflicts() {
        let store = MemoryStore::new();
        let ride = store.insert_ride(new_ride(Uuid::new_v4())).await.unwrap();
        store
            .transition_ride(ride.id, RideStatus::Requested, RideStatus::Cancelled)
            .await
            .unwrap();

        let err = store.claim_ride(ride.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RideError::ClaimConflict));
    }

    #[tokio::test]
    async fn claiming_a_missing_ride_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .claim_ride(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, RideError::NotFound { .. }));
    }

    #[tokio::test]
    async fn transitions_stamp_started_and_completed() {
        let store = MemoryStore::new();
        let ride = store.insert_ride(new_ride(Uuid::new_v4())).await.unwrap();
        store.claim_ride(ride.id, Uuid::new_v4()).await.unwrap();

        let started = store
            .transition_ride(ride.id, RideStatus::Accepted, RideStatus::InProgress)
            .await
            .unwrap();
        assert!(started.started_at.is_some());
        assert!(started.completed_at.is_none());

        let completed = store
            .transition_ride(ride.id, RideStatus::InProgress, RideStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.started_at, started.started_at);
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn stale_expected_status_conflicts() {
        let store = MemoryStore::new();
        let ride = store.insert_ride(new_ride(Uuid::new_v4())).await.unwrap();
        store.claim_ride(ride.id, Uuid::new_v4()).await.unwrap();

        let err = store
            .transition_ride(ride.id, RideStatus::Requested, RideStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RideError::IllegalTransition {
                from: RideStatus::Accepted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn contacts_are_ordered_by_priority() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for (name, priority) in [("backup", 3), ("first", 1), ("second", 2)] {
            store
                .add_contact(NewContact {
                    user_id: user,
                    name: name.into(),
                    phone: "780-555-0100".into(),
                    relationship: "friend".into(),
                    priority,
                })
                .await
                .unwrap();
        }

        let contacts = store.contacts_for_user(user).await.unwrap();
        let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "backup"]);
    }

    #[tokio::test]
    async fn contacts_cannot_be_removed_by_another_user() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let contact = store
            .add_contact(NewContact {
                user_id: owner,
                name: "spouse".into(),
                phone: "780-555-0101".into(),
                relationship: "spouse".into(),
                priority: 1,
            })
            .await
            .unwrap();

        let err = store
            .remove_contact(Uuid::new_v4(), contact.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RideError::NotFound { .. }));
        assert_eq!(store.contacts_for_user(owner).await.unwrap().len(), 1);
    }
}
