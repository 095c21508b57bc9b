use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::{subscription_log, transaction_log};

/// Append-only record of transaction row changes, for troubleshooting.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = transaction_log)]
pub struct TransactionLogEntity {
    pub id: Uuid,
    pub user_id: String,
    pub payment_item_id: String,
    pub provider_id: String,
    pub transaction_id: String,
    pub reason: String,
    pub before: Option<serde_json::Value>,
    pub after: serde_json::Value,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of subscription row changes, for troubleshooting.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = subscription_log)]
pub struct SubscriptionLogEntity {
    pub id: Uuid,
    pub user_id: String,
    pub reason: String,
    pub before: Option<serde_json::Value>,
    pub after: serde_json::Value,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
