use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::transactions::TransactionEntity;
use crate::domain::value_objects::common_filters::CommonFilter;
use crate::domain::value_objects::enums::sort_order::SortOrder;

pub const SCAN_DEFAULT_SIZE: i64 = 10;

/// Generic paginated read over the transaction ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanTransactionsRequest {
    #[serde(default)]
    pub filters: Vec<CommonFilter>,
    #[serde(default)]
    pub from: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub sort_order: String,
}

impl ScanTransactionsRequest {
    /// Applies the documented floors and defaults.
    pub fn normalized(mut self) -> Self {
        if self.size <= 0 {
            self.size = SCAN_DEFAULT_SIZE;
        }
        if self.from < 0 {
            self.from = 0;
        }
        self
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_str(&self.sort_order)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanTransactionsResponse {
    pub items: Vec<TransactionEntity>,
    pub total: i64,
}

/// Outcome of a client-initiated verification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyTransactionResult {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub downgrade_to_vip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downgrade_next_auto_renew_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_upgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_transaction: Option<TransactionEntity>,
}

impl VerifyTransactionResult {
    pub fn is_downgrade(&self) -> bool {
        !self.downgrade_to_vip_id.is_empty()
            && self
                .downgrade_next_auto_renew_at
                .is_some_and(|at| at.timestamp() != 0 || at.timestamp_subsec_nanos() != 0)
    }
}
