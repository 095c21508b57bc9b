use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Apple,
    Google,
    /// Transactions synthesized internally, for example admin gifts.
    Inner,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match self {
            PaymentProvider::Apple => "apple",
            PaymentProvider::Google => "google",
            PaymentProvider::Inner => "inner",
        };
        write!(f, "{}", provider)
    }
}

impl PaymentProvider {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "apple" => Some(PaymentProvider::Apple),
            "google" => Some(PaymentProvider::Google),
            "inner" => Some(PaymentProvider::Inner),
            _ => None,
        }
    }
}
