use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_membership_active_item;

/// Denormalized view of the user's active periods as of the last write.
/// Rebuilt wholesale inside the entitlement transaction.
#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = user_membership_active_item)]
pub struct UserMembershipActiveItemEntity {
    pub id: Uuid,
    pub user_transaction_id: Uuid,
    pub user_id: String,
    pub payment_item_id: String,
    pub remaining_duration_seconds: i64,
    pub activated_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
