use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscription_daily_snapshot;

/// Once-per-day materialization of a subscription row, for reporting.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = subscription_daily_snapshot)]
pub struct SubscriptionDailySnapshotEntity {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub snapshot_date: String,
    pub snapshot_created_at: DateTime<Utc>,
}
