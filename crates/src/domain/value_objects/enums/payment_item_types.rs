use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentItemType {
    AutoRenewableSubscription,
    NonRenewableSubscription,
}

impl Display for PaymentItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let item_type = match self {
            PaymentItemType::AutoRenewableSubscription => "auto_renewable_subscription",
            PaymentItemType::NonRenewableSubscription => "non_renewable_subscription",
        };
        write!(f, "{}", item_type)
    }
}
