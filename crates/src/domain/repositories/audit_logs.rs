use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::audit_logs::{SubscriptionLogEntity, TransactionLogEntity};

/// Write-only sink for the append-only change logs. Callers treat failures
/// as non-fatal.
#[mockall::automock]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn save_transaction_log(&self, log: TransactionLogEntity) -> Result<()>;

    async fn save_subscription_log(&self, log: SubscriptionLogEntity) -> Result<()>;
}
