use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub const TRANSACTION_TYPE_AUTO_RENEWABLE: &str = "Auto-Renewable Subscription";
pub const TRANSACTION_TYPE_NON_RENEWING: &str = "Non-Renewing Subscription";
pub const ENVIRONMENT_PRODUCTION: &str = "Production";
pub const AUTO_RENEW_STATUS_ON: i64 = 1;

/// Decoded claims of a signed transaction (JWSTransaction).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsTransaction {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub original_transaction_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default, rename = "type")]
    pub transaction_type: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub app_account_token: String,
    #[serde(default)]
    pub subscription_group_identifier: String,
    /// Unix milliseconds; zero when absent.
    #[serde(default)]
    pub purchase_date: i64,
    #[serde(default)]
    pub expires_date: i64,
    #[serde(default)]
    pub revocation_date: i64,
    #[serde(default)]
    pub revocation_reason: Option<i64>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub currency: String,
}

/// Decoded claims of a signed renewal info (JWSRenewalInfo).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsRenewalInfo {
    #[serde(default)]
    pub original_transaction_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub auto_renew_product_id: String,
    #[serde(default)]
    pub auto_renew_status: i64,
    /// Unix milliseconds; zero when absent.
    #[serde(default)]
    pub renewal_date: i64,
    #[serde(default)]
    pub environment: String,
}

/// Extracts the claims segment of a JWS compact serialization. The x5c chain
/// check against the pinned provider root happens at the gateway boundary;
/// only the payload claims are needed here.
pub fn decode_jws_payload<T: DeserializeOwned>(token: &str) -> Result<T> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| anyhow!("malformed JWS: missing payload segment"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| anyhow!("malformed JWS payload encoding: {err}"))?;

    serde_json::from_slice(&bytes).map_err(|err| anyhow!("malformed JWS payload JSON: {err}"))
}

#[cfg(test)]
pub(crate) fn encode_test_jws(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","x5c":[]}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
