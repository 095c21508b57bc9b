use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::infra::db::postgres::schema::subscription;

/// Derived per-user subscription state. Exactly one row per user.
/// Use `valid()` to decide whether the subscription currently grants access.
#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = subscription)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.status)
    }

    pub fn valid(&self) -> bool {
        self.status() == SubscriptionStatus::Active
            && self.expire_at.is_some_and(|expire_at| expire_at > Utc::now())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription)]
pub struct InsertSubscriptionEntity {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
