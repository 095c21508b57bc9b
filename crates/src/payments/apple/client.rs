use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::payments::apple::jws::{JwsRenewalInfo, JwsTransaction, decode_jws_payload};
use crate::payments::apple::receipt::IapReceiptResponse;

const API_BASE_PRODUCTION: &str = "https://api.storekit.itunes.apple.com";
const API_BASE_SANDBOX: &str = "https://api.storekit-sandbox.itunes.apple.com";
const VERIFY_RECEIPT_PRODUCTION: &str = "https://buy.itunes.apple.com/verifyReceipt";
const VERIFY_RECEIPT_SANDBOX: &str = "https://sandbox.itunes.apple.com/verifyReceipt";
const TOKEN_TTL_SECONDS: i64 = 20 * 60;

#[derive(Debug, Clone)]
pub struct AppleIapOptions {
    pub key_id: String,
    pub key_content: String,
    pub bundle_id: String,
    pub issuer: String,
    pub shared_secret: String,
    pub sandbox: bool,
}

/// Minimal App Store Server API client built on reqwest.
pub struct AppleStoreClient {
    http: reqwest::Client,
    opts: AppleIapOptions,
}

#[derive(Debug, Serialize)]
struct ApiClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
    bid: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionInfoResponse {
    signed_transaction_info: String,
}

/// Response of the Get All Subscription Statuses endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusesResponse {
    #[serde(default)]
    pub data: Vec<SubscriptionGroupStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionGroupStatus {
    #[serde(default)]
    pub subscription_group_identifier: String,
    #[serde(default)]
    pub last_transactions: Vec<LastTransactionStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTransactionStatus {
    #[serde(default)]
    pub original_transaction_id: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub signed_transaction_info: String,
    #[serde(default)]
    pub signed_renewal_info: String,
}

impl AppleStoreClient {
    pub fn new(opts: AppleIapOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            opts,
        }
    }

    fn api_base(&self) -> &'static str {
        if self.opts.sandbox {
            API_BASE_SANDBOX
        } else {
            API_BASE_PRODUCTION
        }
    }

    fn verify_receipt_url(&self) -> &'static str {
        if self.opts.sandbox {
            VERIFY_RECEIPT_SANDBOX
        } else {
            VERIFY_RECEIPT_PRODUCTION
        }
    }

    /// Signs a short-lived ES256 bearer token for the App Store Server API.
    fn bearer_token(&self) -> Result<String> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.opts.key_id.clone());

        let issued_at = Utc::now().timestamp();
        let claims = ApiClaims {
            iss: &self.opts.issuer,
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECONDS,
            aud: "appstoreconnect-v1",
            bid: &self.opts.bundle_id,
        };

        let key = EncodingKey::from_ec_pem(self.opts.key_content.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "app store api request failed"
        );

        anyhow::bail!("App Store API request failed: {} (status {})", context, status);
    }

    /// Fetches the signed transaction for a transaction id.
    pub async fn get_transaction_info(&self, transaction_id: &str) -> Result<String> {
        let resp = self
            .http
            .get(format!(
                "{}/inApps/v1/transactions/{}",
                self.api_base(),
                transaction_id
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer_token()?))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get transaction info").await?;

        let parsed: TransactionInfoResponse = resp.json().await?;
        Ok(parsed.signed_transaction_info)
    }

    /// Fetches all subscription statuses for the chain the transaction
    /// belongs to.
    pub async fn get_all_subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> Result<SubscriptionStatusesResponse> {
        let resp = self
            .http
            .get(format!(
                "{}/inApps/v1/subscriptions/{}",
                self.api_base(),
                transaction_id
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer_token()?))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get subscription statuses").await?;

        let statuses: SubscriptionStatusesResponse = resp.json().await?;
        Ok(statuses)
    }

    /// Verifies a client-supplied base64 receipt through verifyReceipt.
    pub async fn verify_server_verification_data(
        &self,
        receipt_data: &str,
    ) -> Result<IapReceiptResponse> {
        let body = serde_json::json!({
            "receipt-data": receipt_data,
            "password": self.opts.shared_secret,
            "exclude-old-transactions": true,
        });

        let resp = self
            .http
            .post(self.verify_receipt_url())
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "verify receipt").await?;

        let receipt: IapReceiptResponse = resp.json().await?;
        Ok(receipt)
    }

    pub fn parse_signed_transaction(&self, jws: &str) -> Result<JwsTransaction> {
        decode_jws_payload(jws)
    }

    pub fn parse_signed_renewal_info(&self, jws: &str) -> Result<JwsRenewalInfo> {
        decode_jws_payload(jws)
    }
}
