use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{LocationMessage, RideStatus};
use crate::store::{NewRideLocation, RideStore};

/// Handles one location ping from the ingestion topic.
///
/// Pings are best-effort telemetry: anything malformed, unattributable, or
/// aimed at a ride that is not in progress is logged and dropped rather than
/// failing the consumer.
pub async fn process_ping(store: &dyn RideStore, payload: &[u8]) -> anyhow::Result<()> {
    let message: LocationMessage = match serde_json::from_slice(payload) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse location ping: {}", e);
            return Ok(());
        }
    };

    let ride_id = match message.ride_id.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(_)) | None => {
            warn!("Ping missing a valid ride_id, skipping");
            return Ok(());
        }
    };

    let (latitude, longitude) = match (message.latitude, message.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            warn!(ride_id = %ride_id, "Ping missing coordinates, skipping");
            return Ok(());
        }
    };

    let recorded_at_str = message.recorded_at.as_deref().unwrap_or("");
    let timestamp = match parse_timestamp(recorded_at_str) {
        Some(t) => t,
        None => {
            warn!(ride_id = %ride_id, "Invalid ping timestamp: '{}'", recorded_at_str);
            return Ok(());
        }
    };

    // Trail rows only accumulate while the ride is actually underway.
    match store.ride(ride_id).await? {
        None => {
            warn!(ride_id = %ride_id, "Ping for unknown ride, skipping");
            return Ok(());
        }
        Some(ride) if ride.status != RideStatus::InProgress => {
            info!(ride_id = %ride_id, status = ?ride.status, "Dropping ping for ride not in progress");
            return Ok(());
        }
        Some(_) => {}
    }

    store
        .append_location(NewRideLocation {
            ride_id,
            driver_latitude: latitude,
            driver_longitude: longitude,
            timestamp,
        })
        .await?;

    Ok(())
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
