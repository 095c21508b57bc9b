use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::{
            notification_logs::PaymentNotificationLogEntity,
            transactions::{TransactionDraft, TransactionExtra},
        },
        repositories::{
            audit_logs::AuditLogRepository, entitlements::EntitlementRepository,
            notification_logs::NotificationLogRepository, transactions::TransactionRepository,
        },
        value_objects::{
            enums::{
                notification_statuses::NotificationLogStatus, payment_providers::PaymentProvider,
            },
            payment_items::PaymentItemCatalog,
            transactions::VerifyTransactionResult,
        },
    },
    payments::apple::{
        app_account_token::uuid_to_user_id,
        client::{AppleStoreClient, SubscriptionStatusesResponse},
        jws::{
            AUTO_RENEW_STATUS_ON, ENVIRONMENT_PRODUCTION, JwsRenewalInfo, JwsTransaction,
            TRANSACTION_TYPE_AUTO_RENEWABLE, TRANSACTION_TYPE_NON_RENEWING,
        },
        receipt::IapReceiptResponse,
    },
    tool::generate_uuid_v7,
};
use thiserror::Error;
use tracing::error;

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, API_CODE_ERROR};
use crate::usecases::entitlements::{EntitlementError, EntitlementUseCase};

/// Provider operations the verify flow needs. The signature chain checks
/// live behind this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppleGateway: Send + Sync {
    async fn get_transaction_info(&self, transaction_id: &str) -> AnyResult<String>;

    fn parse_signed_transaction(&self, jws: &str) -> AnyResult<JwsTransaction>;

    async fn get_all_subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> AnyResult<SubscriptionStatusesResponse>;

    fn parse_signed_renewal_info(&self, jws: &str) -> AnyResult<JwsRenewalInfo>;

    async fn verify_server_verification_data(
        &self,
        receipt_data: &str,
    ) -> AnyResult<IapReceiptResponse>;
}

#[async_trait]
impl AppleGateway for AppleStoreClient {
    async fn get_transaction_info(&self, transaction_id: &str) -> AnyResult<String> {
        self.get_transaction_info(transaction_id).await
    }

    fn parse_signed_transaction(&self, jws: &str) -> AnyResult<JwsTransaction> {
        self.parse_signed_transaction(jws)
    }

    async fn get_all_subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> AnyResult<SubscriptionStatusesResponse> {
        self.get_all_subscription_statuses(transaction_id).await
    }

    fn parse_signed_renewal_info(&self, jws: &str) -> AnyResult<JwsRenewalInfo> {
        self.parse_signed_renewal_info(jws)
    }

    async fn verify_server_verification_data(
        &self,
        receipt_data: &str,
    ) -> AnyResult<IapReceiptResponse> {
        self.verify_server_verification_data(receipt_data).await
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("unsupported transaction type: {0}")]
    UnsupportedTxType(String),
    #[error("transaction is not in production environment")]
    EnvironmentMismatch,
    #[error("duplicate transaction already exists: {0}")]
    Duplicate(String),
    #[error("server verification data is empty")]
    MissingVerificationData,
    #[error("payment item not found for product: {0}")]
    UnknownPaymentItem(String),
    #[error("invalid transaction data: {0}")]
    BadData(String),
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl VerifyError {
    pub fn api_code(&self) -> i32 {
        match self {
            VerifyError::Duplicate(_) => API_CODE_BAD_REQUEST,
            VerifyError::Entitlement(err) => err.api_code(),
            _ => API_CODE_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DowngradeInfo {
    pub to_vip_id: String,
    pub next_auto_renew_at: DateTime<Utc>,
}

/// Downgrade is scheduled when the chain's pending renewal still auto-renews
/// but onto a different product. Best-effort: any parse or lookup miss means
/// "no downgrade".
pub fn detect_apple_downgrade(
    receipt: &IapReceiptResponse,
    tx_info: &JwsTransaction,
    catalog: &PaymentItemCatalog,
) -> Option<DowngradeInfo> {
    let pending = receipt
        .pending_renewal_info
        .iter()
        .find(|pending| pending.original_transaction_id == tx_info.original_transaction_id)?;

    if pending.auto_renew_status != "1" || pending.product_id == pending.auto_renew_product_id {
        return None;
    }

    let rows = if receipt.latest_receipt_info.is_empty() {
        &receipt.receipt.in_app
    } else {
        &receipt.latest_receipt_info
    };

    let latest_ms = rows
        .iter()
        .filter(|row| {
            row.original_transaction_id == pending.original_transaction_id
                && row.product_id == pending.product_id
        })
        .filter_map(|row| row.expires_date_ms.parse::<i64>().ok())
        .max()
        .filter(|ms| *ms > 0)?;

    let item = catalog.get_by_provider_item_id(PaymentProvider::Apple, &pending.auto_renew_product_id)?;
    if item.id.is_empty() {
        return None;
    }

    Some(DowngradeInfo {
        to_vip_id: item.id.clone(),
        next_auto_renew_at: DateTime::from_timestamp_millis(latest_ms)?,
    })
}

/// Upgrade shows up as the receipt row right after the current one carrying
/// `is_upgraded`. Returns the superseded transaction id.
pub fn detect_apple_upgrade(receipt: &IapReceiptResponse, transaction_id: &str) -> Option<String> {
    let rows = if receipt.latest_receipt_info.is_empty() {
        &receipt.receipt.in_app
    } else {
        &receipt.latest_receipt_info
    };

    let current = rows
        .iter()
        .position(|row| row.transaction_id == transaction_id)?;

    let next = rows.get(current + 1)?;
    if next.is_upgraded == "true" {
        Some(next.transaction_id.clone())
    } else {
        None
    }
}

/// Client-initiated verification: fetch the signed transaction, normalize,
/// detect upgrade/downgrade, and apply to state.
pub struct VerifyUseCase<G, T, N, E, A>
where
    G: AppleGateway + 'static,
    T: TransactionRepository + 'static,
    N: NotificationLogRepository + 'static,
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
{
    gateway: Arc<G>,
    transaction_repo: Arc<T>,
    notification_logs: Arc<N>,
    entitlements: Arc<EntitlementUseCase<E, A, T>>,
    catalog: PaymentItemCatalog,
    is_prod: bool,
}

impl<G, T, N, E, A> VerifyUseCase<G, T, N, E, A>
where
    G: AppleGateway + 'static,
    T: TransactionRepository + 'static,
    N: NotificationLogRepository + 'static,
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        transaction_repo: Arc<T>,
        notification_logs: Arc<N>,
        entitlements: Arc<EntitlementUseCase<E, A, T>>,
        catalog: PaymentItemCatalog,
        is_prod: bool,
    ) -> Self {
        Self {
            gateway,
            transaction_repo,
            notification_logs,
            entitlements,
            catalog,
            is_prod,
        }
    }

    pub async fn verify_transaction(
        &self,
        provider_id: &str,
        transaction_id: &str,
        server_verification_data: &str,
        trace_id: &str,
    ) -> Result<VerifyTransactionResult, VerifyError> {
        if PaymentProvider::from_str(provider_id) != Some(PaymentProvider::Apple) {
            return Err(VerifyError::UnsupportedProvider(provider_id.to_string()));
        }

        let request_data = serde_json::json!({
            "provider_id": provider_id,
            "transaction_id": transaction_id,
        });

        self.save_log_async(PaymentNotificationLogEntity {
            id: generate_uuid_v7(),
            provider_id: PaymentProvider::Apple.to_string(),
            user_id: None,
            trace_id: trace_id.to_string(),
            transaction_id: transaction_id.to_string(),
            notification_time: Utc::now(),
            data: request_data.clone(),
            result: None,
            status: NotificationLogStatus::Received.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let result = self
            .verify_apple(transaction_id, server_verification_data)
            .await;

        let (status, outcome_json) = match &result {
            Ok(res) => (
                NotificationLogStatus::Handled,
                serde_json::json!({ "transaction": res.user_transaction }),
            ),
            Err(err) => (
                NotificationLogStatus::HandleFailed,
                serde_json::json!({ "error": err.to_string() }),
            ),
        };
        self.save_log_async(PaymentNotificationLogEntity {
            id: generate_uuid_v7(),
            provider_id: PaymentProvider::Apple.to_string(),
            user_id: None,
            trace_id: trace_id.to_string(),
            transaction_id: transaction_id.to_string(),
            notification_time: Utc::now(),
            data: request_data,
            result: Some(outcome_json),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        result
    }

    async fn verify_apple(
        &self,
        transaction_id: &str,
        server_verification_data: &str,
    ) -> Result<VerifyTransactionResult, VerifyError> {
        let signed = self.gateway.get_transaction_info(transaction_id).await?;
        let tx_info = self.gateway.parse_signed_transaction(&signed)?;

        if self.is_prod && tx_info.environment != ENVIRONMENT_PRODUCTION {
            return Err(VerifyError::EnvironmentMismatch);
        }

        if tx_info.transaction_type != TRANSACTION_TYPE_AUTO_RENEWABLE
            && tx_info.transaction_type != TRANSACTION_TYPE_NON_RENEWING
        {
            return Err(VerifyError::UnsupportedTxType(
                tx_info.transaction_type.clone(),
            ));
        }

        let mut draft = self.to_transaction(&tx_info).await?;
        let mut result = VerifyTransactionResult::default();

        if tx_info.transaction_type == TRANSACTION_TYPE_AUTO_RENEWABLE {
            if server_verification_data.is_empty() {
                return Err(VerifyError::MissingVerificationData);
            }

            let receipt = self
                .gateway
                .verify_server_verification_data(server_verification_data)
                .await?;

            if let Some(downgrade) = detect_apple_downgrade(&receipt, &tx_info, &self.catalog) {
                // The current transaction is not applied: the downgrade takes
                // effect at the renewal boundary, nothing changes now.
                result.downgrade_to_vip_id = downgrade.to_vip_id;
                result.downgrade_next_auto_renew_at = Some(downgrade.next_auto_renew_at);
                result.user_transaction = self
                    .transaction_repo
                    .find_by_provider_transaction_id(
                        PaymentProvider::Apple,
                        &tx_info.transaction_id,
                    )
                    .await
                    .unwrap_or(None);
                return Ok(result);
            }

            if let Some(before_transaction_id) =
                detect_apple_upgrade(&receipt, &tx_info.transaction_id)
            {
                draft.before_upgraded_transaction_id = Some(before_transaction_id);
                result.is_upgrade = true;
            }
        }

        if tx_info.transaction_type == TRANSACTION_TYPE_AUTO_RENEWABLE {
            if let Some(parent_transaction_id) = draft.parent_transaction_id.clone() {
                let exists = self
                    .transaction_repo
                    .exists_same_purchase_transaction(
                        &tx_info.transaction_id,
                        PaymentProvider::Apple,
                        &parent_transaction_id,
                        draft.purchase_at,
                    )
                    .await?;
                if exists {
                    return Err(VerifyError::Duplicate(tx_info.transaction_id.clone()));
                }
            }
        }

        let outcome = self
            .entitlements
            .upsert_user_subscription_by_item(draft)
            .await?;

        result.user_transaction = self
            .transaction_repo
            .find_by_provider_transaction_id(PaymentProvider::Apple, &tx_info.transaction_id)
            .await
            .ok()
            .flatten()
            .or(Some(outcome.transaction_after));

        Ok(result)
    }

    /// Maps the decoded signed transaction into a ledger draft. For
    /// auto-renewables the renewal schedule is resolved through the
    /// subscription statuses endpoint.
    async fn to_transaction(&self, tx_info: &JwsTransaction) -> Result<TransactionDraft, VerifyError> {
        let payment_item = self
            .catalog
            .get_by_provider_item_id(PaymentProvider::Apple, &tx_info.product_id)
            .cloned()
            .ok_or_else(|| VerifyError::UnknownPaymentItem(tx_info.product_id.clone()))?;

        if tx_info.app_account_token.is_empty() {
            return Err(VerifyError::BadData("app account token is empty".to_string()));
        }
        let user_id = uuid_to_user_id(&tx_info.app_account_token)
            .map_err(|err| VerifyError::BadData(format!("invalid app account token: {err}")))?;

        let purchase_at = DateTime::from_timestamp_millis(tx_info.purchase_date)
            .ok_or_else(|| VerifyError::BadData("invalid purchase date".to_string()))?;

        let mut draft = TransactionDraft {
            user_id,
            provider_id: PaymentProvider::Apple,
            payment_item_id: payment_item.id.clone(),
            transaction_id: tx_info.transaction_id.clone(),
            parent_transaction_id: None,
            before_upgraded_transaction_id: None,
            currency: tx_info.currency.clone(),
            price: tx_info.price * 100,
            purchase_at,
            refund_at: None,
            auto_renew_expire_at: None,
            next_auto_renew_at: None,
            revocation_date: None,
            revocation_reason: tx_info.revocation_reason.map(|reason| reason.to_string()),
            extra: TransactionExtra {
                operator_id: None,
                payment_item_snapshot: Some(payment_item),
                is_first_purchase: false,
            },
        };

        if !tx_info.original_transaction_id.is_empty() {
            draft.parent_transaction_id = Some(tx_info.original_transaction_id.clone());
        }
        if tx_info.revocation_date > 0 {
            draft.refund_at = DateTime::from_timestamp_millis(tx_info.revocation_date);
            draft.revocation_date = draft.refund_at;
        }

        if tx_info.transaction_type == TRANSACTION_TYPE_AUTO_RENEWABLE {
            if tx_info.expires_date > 0 {
                draft.auto_renew_expire_at = DateTime::from_timestamp_millis(tx_info.expires_date);
            } else {
                return Err(VerifyError::BadData(
                    "auto renew transaction expires date is 0".to_string(),
                ));
            }

            let statuses = self
                .gateway
                .get_all_subscription_statuses(&tx_info.transaction_id)
                .await?;

            for group in &statuses.data {
                if group.subscription_group_identifier != tx_info.subscription_group_identifier {
                    continue;
                }
                for last in &group.last_transactions {
                    let renewal_info =
                        self.gateway.parse_signed_renewal_info(&last.signed_renewal_info)?;
                    if renewal_info.product_id == tx_info.product_id
                        && renewal_info.auto_renew_status == AUTO_RENEW_STATUS_ON
                        && renewal_info.renewal_date > 0
                    {
                        draft.next_auto_renew_at =
                            DateTime::from_timestamp_millis(renewal_info.renewal_date);
                        if draft.parent_transaction_id.is_none() {
                            draft.parent_transaction_id =
                                Some(renewal_info.original_transaction_id.clone());
                        }
                    }
                }
            }
        }

        Ok(draft)
    }

    fn save_log_async(&self, log: PaymentNotificationLogEntity) {
        let notification_logs = Arc::clone(&self.notification_logs);
        tokio::spawn(async move {
            if let Err(err) = notification_logs.save(log).await {
                error!("failed to save notification log: {err}");
            }
        });
    }
}
