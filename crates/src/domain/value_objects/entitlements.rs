use serde::Serialize;

use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::entities::transactions::TransactionEntity;
use crate::domain::value_objects::subscription_periods::ActivePeriod;

/// Everything the entitlement transaction changed, captured for the
/// post-commit audit writers and business hook.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementOutcome {
    pub transaction_before: Option<TransactionEntity>,
    pub transaction_after: TransactionEntity,
    pub subscription_before: Option<SubscriptionEntity>,
    pub subscription_after: SubscriptionEntity,
    pub periods: Vec<ActivePeriod>,
    /// True when the write flipped `valid()` on the subscription row.
    pub subscription_updated: bool,
}

impl EntitlementOutcome {
    pub fn transaction_created(&self) -> bool {
        self.transaction_before.is_none()
    }
}
