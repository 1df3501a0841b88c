//! Emergency escalation: SOS alerts, contact fan-out, and the external
//! dispatch integration.
//!
//! The alert row is written before anything else. Escalation, contact
//! notification, and external dispatch can all fail afterwards without losing
//! the record of the SOS.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{require_user, IdentityProvider};
use crate::error::RideError;
use crate::geo::Coordinates;
use crate::models::{DispatchStatus, EmergencyContact, RideLocation, SosAlert};
use crate::notify::NotificationBus;
use crate::retry::{with_backoff, BackoffPolicy};
use crate::store::{NewContact, NewSosAlert, RideStore};

/// Outbound side of an emergency: the monitoring service that receives the
/// alert and the channel that reaches a contact.
#[async_trait]
pub trait EmergencyGateway: Send + Sync {
    async fn dispatch_alert(&self, alert: &SosAlert) -> anyhow::Result<()>;

    async fn notify_contact(
        &self,
        contact: &EmergencyContact,
        alert: &SosAlert,
    ) -> anyhow::Result<()>;
}

pub struct EmergencyService {
    store: Arc<dyn RideStore>,
    bus: Arc<NotificationBus>,
    gateway: Arc<dyn EmergencyGateway>,
    identity: Arc<dyn IdentityProvider>,
    backoff: BackoffPolicy,
}

impl EmergencyService {
    pub fn new(
        store: Arc<dyn RideStore>,
        bus: Arc<NotificationBus>,
        gateway: Arc<dyn EmergencyGateway>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            bus,
            gateway,
            identity,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Raises an SOS at the given location, optionally tied to a ride.
    ///
    /// Order matters: persist the alert, escalate the ride, notify contacts,
    /// then dispatch externally. A failure at any later step leaves the alert
    /// row in place; external dispatch failure marks it `failed` and surfaces
    /// the error so the caller can re-raise.
    pub async fn trigger_sos(
        &self,
        ride_id: Option<Uuid>,
        location: Coordinates,
    ) -> Result<SosAlert, RideError> {
        let user_id = require_user(self.identity.as_ref())?;

        let mut alert = self
            .store
            .insert_sos(NewSosAlert {
                ride_id,
                user_id,
                latitude: location.latitude,
                longitude: location.longitude,
            })
            .await?;
        info!(alert_id = %alert.id, ride_id = ?ride_id, "SOS alert recorded");

        if let Some(ride_id) = ride_id {
            let ride = self.store.escalate_ride(ride_id).await?;
            self.bus.ride_updated(&ride);
            self.bus.available_rides_changed();
        }

        self.notify_contacts(user_id, &alert).await?;

        let gateway = Arc::clone(&self.gateway);
        let dispatch = with_backoff(self.backoff, "emergency dispatch", {
            let alert = alert.clone();
            move || {
                let gateway = Arc::clone(&gateway);
                let alert = alert.clone();
                async move {
                    gateway
                        .dispatch_alert(&alert)
                        .await
                        .map_err(|e| RideError::External(e.to_string()))
                }
            }
        })
        .await;

        match dispatch {
            Ok(()) => {
                self.store
                    .set_sos_dispatch_status(alert.id, DispatchStatus::Dispatched)
                    .await?;
                alert.dispatch_status = DispatchStatus::Dispatched;
                info!(alert_id = %alert.id, "SOS alert dispatched");
                Ok(alert)
            }
            Err(e) => {
                error!(alert_id = %alert.id, "SOS dispatch failed: {e}");
                self.store
                    .set_sos_dispatch_status(alert.id, DispatchStatus::Failed)
                    .await?;
                Err(e)
            }
        }
    }

    /// Contacts are notified in priority order; one unreachable contact does
    /// not stop the rest.
    async fn notify_contacts(&self, user_id: Uuid, alert: &SosAlert) -> Result<(), RideError> {
        let contacts = self.store.contacts_for_user(user_id).await?;
        for contact in &contacts {
            if let Err(e) = self.gateway.notify_contact(contact, alert).await {
                warn!(
                    alert_id = %alert.id,
                    contact_id = %contact.id,
                    "Failed to notify emergency contact: {e}"
                );
            }
        }
        Ok(())
    }

    pub async fn add_contact(
        &self,
        name: String,
        phone: String,
        relationship: String,
        priority: i32,
    ) -> Result<EmergencyContact, RideError> {
        let user_id = require_user(self.identity.as_ref())?;

        let mut missing = Vec::new();
        if name.trim().is_empty() {
            missing.push("name".to_string());
        }
        if phone.trim().is_empty() {
            missing.push("phone".to_string());
        }
        if !missing.is_empty() {
            return Err(RideError::Validation(missing));
        }

        self.store
            .add_contact(NewContact {
                user_id,
                name: name.trim().to_string(),
                phone: phone.trim().to_string(),
                relationship,
                priority,
            })
            .await
    }

    pub async fn contacts(&self) -> Result<Vec<EmergencyContact>, RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        self.store.contacts_for_user(user_id).await
    }

    pub async fn remove_contact(&self, contact_id: Uuid) -> Result<(), RideError> {
        let user_id = require_user(self.identity.as_ref())?;
        self.store.remove_contact(user_id, contact_id).await
    }

    /// Location trail recorded for a ride, oldest ping first.
    pub async fn ride_trail(&self, ride_id: Uuid) -> Result<Vec<RideLocation>, RideError> {
        self.store.locations_for_ride(ride_id).await
    }
}
