pub const INSERT_RIDE: &str = r#"
INSERT INTO rides (
    id, rider_id, pickup_address, pickup_latitude, pickup_longitude,
    destination_address, destination_latitude, destination_longitude,
    ride_type, status, scheduled_time, fare_amount, payment_status, notes,
    created_at, updated_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'requested', $10, $11, $12, $13, NOW(), NOW())
RETURNING *;
"#;

pub const SELECT_RIDE: &str = r#"
SELECT * FROM rides WHERE id = $1;
"#;

pub const SELECT_RIDES_FOR_USER: &str = r#"
SELECT * FROM rides
WHERE rider_id = $1 OR driver_id = $1
ORDER BY created_at DESC;
"#;

pub const SELECT_AVAILABLE_RIDES: &str = r#"
SELECT * FROM rides
WHERE status = 'requested' AND driver_id IS NULL
ORDER BY created_at ASC;
"#;

// The WHERE clause is the compare half of the compare-and-swap: exactly one
// concurrent claim can match the unclaimed row.
pub const CLAIM_RIDE: &str = r#"
UPDATE rides
SET driver_id = $2,
    status = 'accepted',
    updated_at = NOW()
WHERE id = $1 AND status = 'requested' AND driver_id IS NULL
RETURNING *;
"#;

pub const TRANSITION_RIDE: &str = r#"
UPDATE rides
SET status = $3,
    updated_at = NOW(),
    started_at = CASE WHEN $3 = 'in_progress' THEN NOW() ELSE started_at END,
    completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE completed_at END
WHERE id = $1 AND status = $2
RETURNING *;
"#;

pub const ESCALATE_RIDE: &str = r#"
UPDATE rides
SET status = 'emergency',
    updated_at = NOW()
WHERE id = $1 AND status NOT IN ('completed', 'cancelled', 'emergency')
RETURNING *;
"#;

pub const SET_PAYMENT_STATUS: &str = r#"
UPDATE rides
SET payment_status = $2,
    updated_at = NOW()
WHERE id = $1
RETURNING *;
"#;

pub const UPSERT_DRIVER: &str = r#"
INSERT INTO driver_info (id, user_id, verification_status, background_check_status, created_at, updated_at)
VALUES ($1, $2, 'pending', 'pending', NOW(), NOW())
ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
RETURNING *;
"#;

pub const SELECT_DRIVER: &str = r#"
SELECT * FROM driver_info WHERE user_id = $1;
"#;

pub const SET_DRIVER_AVAILABILITY: &str = r#"
UPDATE driver_info
SET is_available = $2,
    availability_volunteer = $3,
    availability_weekday = $4,
    updated_at = NOW()
WHERE user_id = $1
RETURNING *;
"#;

pub const RECORD_COMPLETED_RIDE: &str = r#"
UPDATE driver_info
SET total_rides = total_rides + 1,
    total_earnings = total_earnings + $2,
    updated_at = NOW()
WHERE user_id = $1;
"#;

pub const INSERT_CONTACT: &str = r#"
INSERT INTO emergency_contacts (id, user_id, name, phone, relationship, priority, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
RETURNING *;
"#;

pub const SELECT_CONTACTS: &str = r#"
SELECT * FROM emergency_contacts
WHERE user_id = $1
ORDER BY priority ASC;
"#;

pub const DELETE_CONTACT: &str = r#"
DELETE FROM emergency_contacts WHERE id = $1 AND user_id = $2;
"#;

pub const INSERT_RIDE_LOCATION: &str = r#"
INSERT INTO ride_locations (ride_id, driver_latitude, driver_longitude, timestamp)
VALUES ($1, $2, $3, $4);
"#;

pub const SELECT_RIDE_LOCATIONS: &str = r#"
SELECT * FROM ride_locations
WHERE ride_id = $1
ORDER BY timestamp ASC;
"#;

pub const INSERT_SOS_ALERT: &str = r#"
INSERT INTO sos_alerts (id, ride_id, user_id, latitude, longitude, triggered_at, dispatch_status)
VALUES ($1, $2, $3, $4, $5, NOW(), 'pending')
RETURNING *;
"#;

pub const SELECT_SOS_ALERT: &str = r#"
SELECT * FROM sos_alerts WHERE id = $1;
"#;

pub const SET_SOS_DISPATCH_STATUS: &str = r#"
UPDATE sos_alerts SET dispatch_status = $2 WHERE id = $1;
"#;
