use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_notification_log;

/// Audit row for every inbound provider notification or verify call.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = payment_notification_log)]
pub struct PaymentNotificationLogEntity {
    pub id: Uuid,
    pub provider_id: String,
    pub user_id: Option<String>,
    pub trace_id: String,
    pub transaction_id: String,
    pub notification_time: DateTime<Utc>,
    pub data: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
