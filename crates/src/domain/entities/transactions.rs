use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{
    enums::payment_providers::PaymentProvider, payment_items::PaymentItem,
};
use crate::infra::db::postgres::schema::transaction;

/// JSON side-channel stored with every transaction row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    /// Captured at first write and preserved across updates.
    #[serde(default)]
    pub payment_item_snapshot: Option<PaymentItem>,
    /// Set on creation iff the user had no prior transaction row.
    #[serde(default)]
    pub is_first_purchase: bool,
}

/// One row per provider x transaction id; the append-mostly purchase ledger.
#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, QueryableByName, Serialize, Deserialize)]
#[diesel(table_name = transaction)]
pub struct TransactionEntity {
    pub id: Uuid,
    pub user_id: String,
    pub provider_id: String,
    pub payment_item_id: String,
    pub transaction_id: String,
    pub parent_transaction_id: Option<String>,
    pub before_upgraded_transaction_id: Option<String>,
    pub currency: String,
    pub price: i64,
    pub purchase_at: DateTime<Utc>,
    pub refund_at: Option<DateTime<Utc>>,
    /// Provider-computed expiry for auto-renewable subscriptions.
    #[diesel(column_name = expire_at)]
    pub auto_renew_expire_at: Option<DateTime<Utc>>,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub revocation_date: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionEntity {
    pub fn extra(&self) -> TransactionExtra {
        serde_json::from_value(self.extra.clone()).unwrap_or_default()
    }

    pub fn payment_item_snapshot(&self) -> Option<PaymentItem> {
        self.extra().payment_item_snapshot
    }

    pub fn is_auto_renewable(&self) -> bool {
        self.next_auto_renew_at.is_some()
    }

    pub fn provider(&self) -> Option<PaymentProvider> {
        PaymentProvider::from_str(&self.provider_id)
    }
}

/// An incoming transaction as produced by the provider normalizers, before
/// the ledger assigns identity and bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub user_id: String,
    pub provider_id: PaymentProvider,
    pub payment_item_id: String,
    pub transaction_id: String,
    pub parent_transaction_id: Option<String>,
    pub before_upgraded_transaction_id: Option<String>,
    pub currency: String,
    pub price: i64,
    pub purchase_at: DateTime<Utc>,
    pub refund_at: Option<DateTime<Utc>>,
    pub auto_renew_expire_at: Option<DateTime<Utc>>,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub revocation_date: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub extra: TransactionExtra,
}

impl TransactionDraft {
    pub fn is_auto_renewable(&self) -> bool {
        self.next_auto_renew_at.is_some()
    }

    pub fn payment_item_snapshot(&self) -> Option<&PaymentItem> {
        self.extra.payment_item_snapshot.as_ref()
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = transaction, treat_none_as_null = true)]
pub struct InsertTransactionEntity {
    pub id: Uuid,
    pub user_id: String,
    pub provider_id: String,
    pub payment_item_id: String,
    pub transaction_id: String,
    pub parent_transaction_id: Option<String>,
    pub before_upgraded_transaction_id: Option<String>,
    pub currency: String,
    pub price: i64,
    pub purchase_at: DateTime<Utc>,
    pub refund_at: Option<DateTime<Utc>>,
    #[diesel(column_name = expire_at)]
    pub auto_renew_expire_at: Option<DateTime<Utc>>,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub revocation_date: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
