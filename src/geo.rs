//! Great-circle distance between coordinate pairs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Haversine distance in kilometers between two points.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNTOWN: Coordinates = Coordinates {
        latitude: 53.5461,
        longitude: -113.4938,
    };
    const AIRPORT: Coordinates = Coordinates {
        latitude: 53.3097,
        longitude: -113.5800,
    };

    #[test]
    fn identical_coordinates_have_zero_distance() {
        assert_eq!(distance_km(DOWNTOWN, DOWNTOWN), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_km(DOWNTOWN, AIRPORT);
        let back = distance_km(AIRPORT, DOWNTOWN);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn downtown_to_airport_is_about_27_km() {
        let d = distance_km(DOWNTOWN, AIRPORT);
        assert!(d > 25.0 && d < 29.0, "got {d} km");
    }
}
