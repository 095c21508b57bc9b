use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLogStatus {
    Received,
    Handled,
    HandleFailed,
}

impl Display for NotificationLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            NotificationLogStatus::Received => "received",
            NotificationLogStatus::Handled => "handled",
            NotificationLogStatus::HandleFailed => "handle_failed",
        };
        write!(f, "{}", status)
    }
}
