//! Fare policy: base fare plus per-kilometer rate with a per-category floor.

use crate::geo::{self, Coordinates};
use crate::models::RideCategory;

pub const WEEKDAY_BASE_FARE: f64 = 5.0;
pub const WEEKDAY_PER_KM_RATE: f64 = 1.5;
/// Edmonton vehicle-for-hire bylaw minimum.
pub const WEEKDAY_MINIMUM_FARE: f64 = 3.5;

pub const DRIVE_BACK_BASE_FARE: f64 = 10.0;
pub const DRIVE_BACK_PER_KM_RATE: f64 = 2.0;
pub const DRIVE_BACK_MINIMUM_FARE: f64 = 10.0;

/// Fare for a ride between two points. `None` for the free volunteer
/// category; paid categories always produce an amount.
pub fn calculate_fare(
    category: RideCategory,
    pickup: Coordinates,
    destination: Coordinates,
) -> Option<f64> {
    fare_for_distance(category, geo::distance_km(pickup, destination))
}

/// Fare for a known trip distance, rounded to cents.
pub fn fare_for_distance(category: RideCategory, distance_km: f64) -> Option<f64> {
    let amount = match category {
        RideCategory::Volunteer => return None,
        RideCategory::Weekday => {
            (WEEKDAY_BASE_FARE + distance_km * WEEKDAY_PER_KM_RATE).max(WEEKDAY_MINIMUM_FARE)
        }
        RideCategory::DriveBack => {
            (DRIVE_BACK_BASE_FARE + distance_km * DRIVE_BACK_PER_KM_RATE)
                .max(DRIVE_BACK_MINIMUM_FARE)
        }
    };
    Some(round_to_cents(amount))
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volunteer_rides_are_free_at_any_distance() {
        for km in [0.0, 1.0, 10.0, 250.0] {
            assert_eq!(fare_for_distance(RideCategory::Volunteer, km), None);
        }
    }

    #[test]
    fn weekday_fare_is_base_plus_rate() {
        assert_eq!(fare_for_distance(RideCategory::Weekday, 0.0), Some(5.0));
        assert_eq!(fare_for_distance(RideCategory::Weekday, 10.0), Some(20.0));
    }

    #[test]
    fn drive_back_fare_is_base_plus_rate() {
        assert_eq!(fare_for_distance(RideCategory::DriveBack, 0.0), Some(10.0));
        assert_eq!(fare_for_distance(RideCategory::DriveBack, 5.0), Some(20.0));
    }

    #[test]
    fn fares_are_rounded_to_cents() {
        // 5 + 1.234 * 1.5 = 6.851
        assert_eq!(fare_for_distance(RideCategory::Weekday, 1.234), Some(6.85));
        // 10 + 0.333 * 2 = 10.666
        assert_eq!(
            fare_for_distance(RideCategory::DriveBack, 0.333),
            Some(10.67)
        );
    }

    #[test]
    fn calculate_fare_uses_great_circle_distance() {
        let a = crate::geo::Coordinates {
            latitude: 53.5461,
            longitude: -113.4938,
        };
        let fare = calculate_fare(RideCategory::Weekday, a, a);
        assert_eq!(fare, Some(WEEKDAY_BASE_FARE));
    }
}
