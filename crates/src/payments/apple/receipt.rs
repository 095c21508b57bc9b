use serde::Deserialize;

/// Response of the legacy verifyReceipt endpoint, reduced to the fields the
/// verify flow consumes. Numeric fields arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IapReceiptResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub latest_receipt_info: Vec<ReceiptInApp>,
    #[serde(default)]
    pub receipt: ReceiptBlock,
    #[serde(default)]
    pub pending_renewal_info: Vec<PendingRenewalInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptBlock {
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default)]
    pub in_app: Vec<ReceiptInApp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptInApp {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub original_transaction_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub purchase_date_ms: String,
    #[serde(default)]
    pub expires_date_ms: String,
    #[serde(default)]
    pub is_upgraded: String,
    #[serde(default)]
    pub app_account_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingRenewalInfo {
    #[serde(default)]
    pub original_transaction_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub auto_renew_product_id: String,
    #[serde(default)]
    pub auto_renew_status: String,
}
