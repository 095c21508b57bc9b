use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::transactions::TransactionDraft;
use crate::domain::value_objects::entitlements::EntitlementOutcome;
use crate::domain::value_objects::enums::change_reasons::SubscriptionChangeReason;

/// Storage-side half of the entitlement writer. One call runs the whole
/// upsert-rebuild-update sequence in a single serializable transaction;
/// failures roll back every mutation.
#[mockall::automock]
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    async fn apply_transaction(
        &self,
        draft: TransactionDraft,
        reason: SubscriptionChangeReason,
    ) -> Result<EntitlementOutcome>;
}
