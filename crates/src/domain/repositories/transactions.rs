use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::transactions::TransactionEntity;
use crate::domain::value_objects::enums::payment_providers::PaymentProvider;
use crate::domain::value_objects::transactions::{
    ScanTransactionsRequest, ScanTransactionsResponse,
};

#[mockall::automock]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_provider_transaction_id(
        &self,
        provider_id: PaymentProvider,
        transaction_id: &str,
    ) -> Result<Option<TransactionEntity>>;

    /// True when another transaction of the same auto-renew chain shares the
    /// purchase instant; used to deduplicate double verifications.
    async fn exists_same_purchase_transaction(
        &self,
        transaction_id: &str,
        provider_id: PaymentProvider,
        parent_transaction_id: &str,
        purchase_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// All of the user's transactions, newest purchase first.
    async fn list_user_transactions(&self, user_id: &str) -> Result<Vec<TransactionEntity>>;

    async fn scan_transactions(
        &self,
        request: &ScanTransactionsRequest,
    ) -> Result<ScanTransactionsResponse>;
}
