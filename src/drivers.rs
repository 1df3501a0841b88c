//! Driver enrolment and availability.

use std::sync::Arc;

use tracing::info;

use crate::auth::{require_user, IdentityProvider};
use crate::error::RideError;
use crate::models::DriverInfo;
use crate::store::{Availability, RideStore};

pub struct DriverService {
    store: Arc<dyn RideStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl DriverService {
    pub fn new(store: Arc<dyn RideStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Opts the calling user in as a driver. First call creates the profile
    /// with verification and background check pending; repeat calls return
    /// the existing profile untouched.
    pub async fn register(&self) -> Result<DriverInfo, RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        let driver = self.store.upsert_driver(user_id).await?;
        info!(user_id = %user_id, "Driver profile ensured");
        Ok(driver)
    }

    pub async fn profile(&self) -> Result<DriverInfo, RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        self.store
            .driver(user_id)
            .await?
            .ok_or_else(|| RideError::not_found("driver", user_id))
    }

    pub async fn set_availability(&self, availability: Availability) -> Result<DriverInfo, RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        self.store.set_driver_availability(user_id, availability).await
    }
}
