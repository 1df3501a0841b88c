use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Whether the external emergency integration has been reached for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "dispatch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Dispatched,
    Failed,
}

/// Durable record of an SOS trigger. Written before any external call so a
/// distress signal always leaves a trace, even when every integration fails.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SosAlert {
    pub id: Uuid,
    pub ride_id: Option<Uuid>,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub triggered_at: NaiveDateTime,
    pub dispatch_status: DispatchStatus,
}
