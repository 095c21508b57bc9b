use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Why a user's subscription state changed. Persisted in the audit logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionChangeReason {
    Purchase,
    Refund,
    CancelRenew,
    Gift,
    Upgrade,
}

impl Display for SubscriptionChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SubscriptionChangeReason::Purchase => "purchase",
            SubscriptionChangeReason::Refund => "refund",
            SubscriptionChangeReason::CancelRenew => "cancelRenew",
            SubscriptionChangeReason::Gift => "gift",
            SubscriptionChangeReason::Upgrade => "upgrade",
        };
        write!(f, "{}", reason)
    }
}
