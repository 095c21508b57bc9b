use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::payments::apple::jws::{JwsRenewalInfo, JwsTransaction, decode_jws_payload};

/// Body of an App Store Server Notification V2 request.
#[derive(Debug, Clone, Deserialize)]
pub struct AppStoreServerRequest {
    #[serde(rename = "signedPayload")]
    pub signed_payload: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default)]
    pub notification_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
    #[serde(default, rename = "notificationUUID")]
    pub notification_uuid: String,
    #[serde(default)]
    pub signed_date: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default)]
    pub signed_transaction_info: String,
    #[serde(default)]
    pub signed_renewal_info: String,
}

/// A fully decoded server notification, with the nested signed blocks
/// expanded.
#[derive(Debug, Clone)]
pub struct AppleNotification {
    pub payload: NotificationPayload,
    pub transaction_info: Option<JwsTransaction>,
    pub renewal_info: Option<JwsRenewalInfo>,
    pub is_test_notification: bool,
    pub is_sandbox: bool,
}

impl AppleNotification {
    pub fn transaction_info(&self) -> Result<&JwsTransaction> {
        self.transaction_info
            .as_ref()
            .ok_or_else(|| anyhow!("notification has no transaction info"))
    }
}

/// Decodes the outer signed payload and its nested transaction/renewal
/// blocks. TEST notifications carry no transaction data and are returned
/// as-is.
pub fn decode(signed_payload: &str) -> Result<AppleNotification> {
    let payload: NotificationPayload = decode_jws_payload(signed_payload)?;

    let is_test_notification = payload.notification_type == "TEST";
    let is_sandbox = payload
        .data
        .as_ref()
        .is_some_and(|data| data.environment == "Sandbox");

    if is_test_notification {
        return Ok(AppleNotification {
            payload,
            transaction_info: None,
            renewal_info: None,
            is_test_notification,
            is_sandbox,
        });
    }

    let data = payload
        .data
        .as_ref()
        .ok_or_else(|| anyhow!("notification data is missing"))?;

    let transaction_info: JwsTransaction = decode_jws_payload(&data.signed_transaction_info)?;

    let renewal_info = if data.signed_renewal_info.is_empty() {
        None
    } else {
        Some(decode_jws_payload::<JwsRenewalInfo>(&data.signed_renewal_info)?)
    };

    Ok(AppleNotification {
        payload,
        transaction_info: Some(transaction_info),
        renewal_info,
        is_test_notification,
        is_sandbox,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::apple::jws::{TRANSACTION_TYPE_AUTO_RENEWABLE, encode_test_jws};

    fn signed_notification(renewal: bool) -> String {
        let transaction = encode_test_jws(&serde_json::json!({
            "transactionId": "2000000123",
            "originalTransactionId": "2000000100",
            "productId": "vip.high.month",
            "type": TRANSACTION_TYPE_AUTO_RENEWABLE,
            "purchaseDate": 1735689600000i64,
            "expiresDate": 1738368000000i64,
        }));
        let renewal_info = encode_test_jws(&serde_json::json!({
            "originalTransactionId": "2000000100",
            "productId": "vip.high.month",
            "autoRenewStatus": 1,
            "renewalDate": 1738368000000i64,
        }));

        encode_test_jws(&serde_json::json!({
            "notificationType": "DID_RENEW",
            "notificationUUID": "5e3f-0001",
            "data": {
                "environment": "Production",
                "bundleId": "com.example.app",
                "signedTransactionInfo": transaction,
                "signedRenewalInfo": if renewal { renewal_info } else { String::new() },
            },
        }))
    }

    #[test]
    fn decodes_nested_signed_blocks() {
        let notification = decode(&signed_notification(true)).unwrap();

        assert!(!notification.is_test_notification);
        assert!(!notification.is_sandbox);
        assert_eq!(notification.payload.notification_type, "DID_RENEW");

        let transaction = notification.transaction_info().unwrap();
        assert_eq!(transaction.transaction_id, "2000000123");

        let renewal = notification.renewal_info.unwrap();
        assert_eq!(renewal.renewal_date, 1_738_368_000_000);
    }

    #[test]
    fn renewal_info_is_optional() {
        let notification = decode(&signed_notification(false)).unwrap();
        assert!(notification.renewal_info.is_none());
    }

    #[test]
    fn test_notifications_skip_transaction_decoding() {
        let payload = encode_test_jws(&serde_json::json!({
            "notificationType": "TEST",
        }));

        let notification = decode(&payload).unwrap();

        assert!(notification.is_test_notification);
        assert!(notification.transaction_info.is_none());
    }
}
