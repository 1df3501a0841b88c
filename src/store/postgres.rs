//! Postgres-backed store. Conditional updates in `db::queries` carry the
//! compare-and-swap semantics; this layer only interprets row counts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::RideError;
use crate::models::{
    DispatchStatus, DriverInfo, EmergencyContact, PaymentStatus, Ride, RideLocation, RideStatus,
    SosAlert,
};
use crate::store::{
    Availability, NewContact, NewRide, NewRideLocation, NewSosAlert, RideStore,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_ride(&self, id: Uuid) -> Result<Option<Ride>, RideError> {
        let ride = sqlx::query_as::<_, Ride>(queries::SELECT_RIDE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ride)
    }
}

#[async_trait]
impl RideStore for PgStore {
    async fn insert_ride(&self, new: NewRide) -> Result<Ride, RideError> {
        let ride = sqlx::query_as::<_, Ride>(queries::INSERT_RIDE)
            .bind(Uuid::new_v4())
            .bind(new.rider_id)
            .bind(&new.pickup_address)
            .bind(new.pickup_latitude)
            .bind(new.pickup_longitude)
            .bind(&new.destination_address)
            .bind(new.destination_latitude)
            .bind(new.destination_longitude)
            .bind(new.ride_type)
            .bind(new.scheduled_time)
            .bind(new.fare_amount)
            .bind(new.payment_status)
            .bind(&new.notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(ride)
    }

    async fn ride(&self, id: Uuid) -> Result<Option<Ride>, RideError> {
        self.fetch_ride(id).await
    }

    async fn rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RideError> {
        let rides = sqlx::query_as::<_, Ride>(queries::SELECT_RIDES_FOR_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rides)
    }

    async fn available_rides(&self) -> Result<Vec<Ride>, RideError> {
        let rides = sqlx::query_as::<_, Ride>(queries::SELECT_AVAILABLE_RIDES)
            .fetch_all(&self.pool)
            .await?;
        Ok(rides)
    }

    async fn claim_ride(&self, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, RideError> {
        let claimed = sqlx::query_as::<_, Ride>(queries::CLAIM_RIDE)
            .bind(ride_id)
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await?;

        match claimed {
            Some(ride) => Ok(ride),
            // Zero rows: either someone else got there first or the id is bogus.
            None => match self.fetch_ride(ride_id).await? {
                Some(_) => Err(RideError::ClaimConflict),
                None => Err(RideError::not_found("ride", ride_id)),
            },
        }
    }

    async fn transition_ride(
        &self,
        ride_id: Uuid,
        from: RideStatus,
        to: RideStatus,
    ) -> Result<Ride, RideError> {
        let updated = sqlx::query_as::<_, Ride>(queries::TRANSITION_RIDE)
            .bind(ride_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(ride) => Ok(ride),
            None => match self.fetch_ride(ride_id).await? {
                Some(current) => Err(RideError::IllegalTransition {
                    from: current.status,
                    to,
                }),
                None => Err(RideError::not_found("ride", ride_id)),
            },
        }
    }

    async fn escalate_ride(&self, ride_id: Uuid) -> Result<Ride, RideError> {
        let updated = sqlx::query_as::<_, Ride>(queries::ESCALATE_RIDE)
            .bind(ride_id)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(ride) => Ok(ride),
            None => match self.fetch_ride(ride_id).await? {
                Some(current) => Err(RideError::IllegalTransition {
                    from: current.status,
                    to: RideStatus::Emergency,
                }),
                None => Err(RideError::not_found("ride", ride_id)),
            },
        }
    }

    async fn set_payment_status(
        &self,
        ride_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Ride, RideError> {
        sqlx::query_as::<_, Ride>(queries::SET_PAYMENT_STATUS)
            .bind(ride_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RideError::not_found("ride", ride_id))
    }

    async fn upsert_driver(&self, user_id: Uuid) -> Result<DriverInfo, RideError> {
        let driver = sqlx::query_as::<_, DriverInfo>(queries::UPSERT_DRIVER)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn driver(&self, user_id: Uuid) -> Result<Option<DriverInfo>, RideError> {
        let driver = sqlx::query_as::<_, DriverInfo>(queries::SELECT_DRIVER)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn set_driver_availability(
        &self,
        user_id: Uuid,
        availability: Availability,
    ) -> Result<DriverInfo, RideError> {
        sqlx::query_as::<_, DriverInfo>(queries::SET_DRIVER_AVAILABILITY)
            .bind(user_id)
            .bind(availability.is_available)
            .bind(availability.volunteer)
            .bind(availability.weekday)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RideError::not_found("driver", user_id))
    }

    async fn record_completed_ride(
        &self,
        driver_id: Uuid,
        fare: Option<f64>,
    ) -> Result<(), RideError> {
        sqlx::query(queries::RECORD_COMPLETED_RIDE)
            .bind(driver_id)
            .bind(fare.unwrap_or(0.0))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_contact(&self, new: NewContact) -> Result<EmergencyContact, RideError> {
        let contact = sqlx::query_as::<_, EmergencyContact>(queries::INSERT_CONTACT)
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(&new.name)
            .bind(&new.phone)
            .bind(&new.relationship)
            .bind(new.priority)
            .fetch_one(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn contacts_for_user(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>, RideError> {
        let contacts = sqlx::query_as::<_, EmergencyContact>(queries::SELECT_CONTACTS)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn remove_contact(&self, user_id: Uuid, contact_id: Uuid) -> Result<(), RideError> {
        let result = sqlx::query(queries::DELETE_CONTACT)
            .bind(contact_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RideError::not_found("emergency contact", contact_id));
        }
        Ok(())
    }

    async fn append_location(&self, ping: NewRideLocation) -> Result<(), RideError> {
        sqlx::query(queries::INSERT_RIDE_LOCATION)
            .bind(ping.ride_id)
            .bind(ping.driver_latitude)
            .bind(ping.driver_longitude)
            .bind(ping.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn locations_for_ride(&self, ride_id: Uuid) -> Result<Vec<RideLocation>, RideError> {
        let trail = sqlx::query_as::<_, RideLocation>(queries::SELECT_RIDE_LOCATIONS)
            .bind(ride_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(trail)
    }

    async fn insert_sos(&self, new: NewSosAlert) -> Result<SosAlert, RideError> {
        let alert = sqlx::query_as::<_, SosAlert>(queries::INSERT_SOS_ALERT)
            .bind(Uuid::new_v4())
            .bind(new.ride_id)
            .bind(new.user_id)
            .bind(new.latitude)
            .bind(new.longitude)
            .fetch_one(&self.pool)
            .await?;
        Ok(alert)
    }

    async fn sos_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>, RideError> {
        let alert = sqlx::query_as::<_, SosAlert>(queries::SELECT_SOS_ALERT)
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(alert)
    }

    async fn set_sos_dispatch_status(
        &self,
        alert_id: Uuid,
        status: DispatchStatus,
    ) -> Result<(), RideError> {
        sqlx::query(queries::SET_SOS_DISPATCH_STATUS)
            .bind(alert_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
