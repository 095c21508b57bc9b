use std::sync::Arc;

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
            payment_items::{PaymentItem, PaymentItemCatalog},
        },
    },
    payments::apple::{
        app_account_token::uuid_to_user_id,
        jws::AUTO_RENEW_STATUS_ON,
        notification::{AppStoreServerRequest, AppleNotification},
    },
    tool::generate_uuid_v7,
};
use thiserror::Error;
use tracing::{error, info};

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, API_CODE_ERROR};
use crate::usecases::entitlements::{EntitlementError, EntitlementUseCase};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("invalid notification payload: {0}")]
    BadPayload(String),
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NotificationError {
    pub fn api_code(&self) -> i32 {
        match self {
            NotificationError::BadPayload(_) => API_CODE_BAD_REQUEST,
            NotificationError::Entitlement(err) => err.api_code(),
            _ => API_CODE_ERROR,
        }
    }
}

/// Capability set a provider notification exposes once decoded.
pub trait NotificationParser: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    fn notification_time(&self) -> DateTime<Utc>;

    fn app(&self) -> String;

    fn user_id(&self) -> Result<String, NotificationError>;

    fn transaction_id(&self) -> String;

    fn payment_item(&self) -> Result<PaymentItem, NotificationError>;

    /// The canonical transaction, or None when the notification concerns a
    /// product outside the subscription model.
    fn transaction(&self) -> Result<Option<TransactionDraft>, NotificationError>;

    fn data(&self) -> serde_json::Value;
}

pub struct AppleNotificationParser {
    catalog: PaymentItemCatalog,
    notification_time: DateTime<Utc>,
    notification: AppleNotification,
}

impl AppleNotificationParser {
    pub fn new(
        catalog: PaymentItemCatalog,
        body: &str,
        notification_time: DateTime<Utc>,
    ) -> Result<Self, NotificationError> {
        let request: AppStoreServerRequest = serde_json::from_str(body)
            .map_err(|err| NotificationError::BadPayload(err.to_string()))?;

        let notification = crates::payments::apple::notification::decode(&request.signed_payload)
            .map_err(|err| NotificationError::BadPayload(err.to_string()))?;

        Ok(Self {
            catalog,
            notification_time,
            notification,
        })
    }
}

impl NotificationParser for AppleNotificationParser {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Apple
    }

    fn notification_time(&self) -> DateTime<Utc> {
        self.notification_time
    }

    fn app(&self) -> String {
        self.notification
            .transaction_info
            .as_ref()
            .map(|info| info.bundle_id.clone())
            .unwrap_or_default()
    }

    fn user_id(&self) -> Result<String, NotificationError> {
        let info = self
            .notification
            .transaction_info()
            .map_err(|err| NotificationError::BadPayload(err.to_string()))?;

        if info.app_account_token.is_empty() {
            return Err(NotificationError::BadPayload(
                "app account token is empty".to_string(),
            ));
        }

        uuid_to_user_id(&info.app_account_token)
            .map_err(|err| NotificationError::BadPayload(format!("invalid app account token: {err}")))
    }

    fn transaction_id(&self) -> String {
        self.notification
            .transaction_info
            .as_ref()
            .map(|info| info.transaction_id.clone())
            .unwrap_or_default()
    }

    fn payment_item(&self) -> Result<PaymentItem, NotificationError> {
        let info = self
            .notification
            .transaction_info()
            .map_err(|err| NotificationError::BadPayload(err.to_string()))?;

        self.catalog
            .get_by_provider_item_id(self.provider(), &info.product_id)
            .cloned()
            .ok_or_else(|| {
                NotificationError::Entitlement(EntitlementError::UnknownPaymentItem(
                    info.product_id.clone(),
                ))
            })
    }

    fn transaction(&self) -> Result<Option<TransactionDraft>, NotificationError> {
        if self.notification.is_test_notification {
            return Ok(None);
        }

        let payment_item = self.payment_item()?;
        if !payment_item.is_subscription() {
            return Ok(None);
        }

        let info = self
            .notification
            .transaction_info()
            .map_err(|err| NotificationError::BadPayload(err.to_string()))?;

        let user_id = self.user_id()?;
        let purchase_at = DateTime::from_timestamp_millis(info.purchase_date)
            .ok_or_else(|| NotificationError::BadPayload("invalid purchase date".to_string()))?;

        let mut draft = TransactionDraft {
            user_id,
            provider_id: self.provider(),
            payment_item_id: payment_item.id.clone(),
            transaction_id: info.transaction_id.clone(),
            parent_transaction_id: None,
            before_upgraded_transaction_id: None,
            currency: info.currency.clone(),
            price: info.price * 100,
            purchase_at,
            refund_at: None,
            auto_renew_expire_at: None,
            next_auto_renew_at: None,
            revocation_date: None,
            revocation_reason: info.revocation_reason.map(|reason| reason.to_string()),
            extra: TransactionExtra {
                operator_id: None,
                payment_item_snapshot: Some(payment_item.clone()),
                is_first_purchase: false,
            },
        };

        if info.revocation_date > 0 {
            draft.refund_at = DateTime::from_timestamp_millis(info.revocation_date);
            draft.revocation_date = draft.refund_at;
        }

        if payment_item.renewable() && info.expires_date > 0 {
            draft.auto_renew_expire_at = DateTime::from_timestamp_millis(info.expires_date);
        }

        if let Some(renewal_info) = &self.notification.renewal_info {
            // https://developer.apple.com/documentation/appstoreserverapi/autorenewstatus
            if renewal_info.auto_renew_status == AUTO_RENEW_STATUS_ON
                && renewal_info.renewal_date > 0
            {
                draft.next_auto_renew_at = DateTime::from_timestamp_millis(renewal_info.renewal_date);
            }
            draft.parent_transaction_id = Some(renewal_info.original_transaction_id.clone());
        }

        Ok(Some(draft))
    }

    fn data(&self) -> serde_json::Value {
        serde_json::json!({
            "notification_type": self.notification.payload.notification_type,
            "subtype": self.notification.payload.subtype,
            "notification_uuid": self.notification.payload.notification_uuid,
            "transaction_info": self.notification.transaction_info.as_ref().map(|info| serde_json::json!({
                "transaction_id": info.transaction_id,
                "original_transaction_id": info.original_transaction_id,
                "product_id": info.product_id,
                "purchase_date": info.purchase_date,
                "expires_date": info.expires_date,
            })),
        })
    }
}

/// Provider-agnostic webhook pipeline: log, parse, apply, log outcome.
pub struct NotificationIngestUseCase<E, A, T, N>
where
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
    T: TransactionRepository + 'static,
    N: NotificationLogRepository + 'static,
{
    catalog: PaymentItemCatalog,
    entitlements: Arc<EntitlementUseCase<E, A, T>>,
    notification_logs: Arc<N>,
}

impl<E, A, T, N> NotificationIngestUseCase<E, A, T, N>
where
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
    T: TransactionRepository + 'static,
    N: NotificationLogRepository + 'static,
{
    pub fn new(
        catalog: PaymentItemCatalog,
        entitlements: Arc<EntitlementUseCase<E, A, T>>,
        notification_logs: Arc<N>,
    ) -> Self {
        Self {
            catalog,
            entitlements,
            notification_logs,
        }
    }

    pub async fn handle_notification(
        &self,
        provider_id: &str,
        body: &str,
        trace_id: &str,
    ) -> Result<(), NotificationError> {
        let provider = PaymentProvider::from_str(provider_id)
            .filter(|provider| *provider == PaymentProvider::Apple)
            .ok_or_else(|| NotificationError::UnsupportedProvider(provider_id.to_string()))?;

        let parser = AppleNotificationParser::new(self.catalog.clone(), body, Utc::now())?;

        let user_id = parser.user_id().ok();
        let data = parser.data();

        self.save_log_async(PaymentNotificationLogEntity {
            id: generate_uuid_v7(),
            provider_id: provider.to_string(),
            user_id: user_id.clone(),
            trace_id: trace_id.to_string(),
            transaction_id: parser.transaction_id(),
            notification_time: parser.notification_time(),
            data: data.clone(),
            result: None,
            status: NotificationLogStatus::Received.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let outcome = self.process(&parser).await;

        let (status, result_json) = match &outcome {
            Ok(transaction) => (
                NotificationLogStatus::Handled,
                serde_json::json!({ "transaction": transaction }),
            ),
            Err(err) => (
                NotificationLogStatus::HandleFailed,
                serde_json::json!({ "error": err.to_string() }),
            ),
        };
        self.save_log_async(PaymentNotificationLogEntity {
            id: generate_uuid_v7(),
            provider_id: provider.to_string(),
            user_id,
            trace_id: trace_id.to_string(),
            transaction_id: parser.transaction_id(),
            notification_time: Utc::now(),
            data,
            result: Some(result_json),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        outcome.map(|_| ())
    }

    async fn process(
        &self,
        parser: &dyn NotificationParser,
    ) -> Result<Option<TransactionDraft>, NotificationError> {
        let draft = parser.transaction()?;

        match draft {
            Some(draft) => {
                info!(
                    transaction_id = %draft.transaction_id,
                    user_id = %draft.user_id,
                    "got transaction from notification"
                );
                self.entitlements
                    .upsert_user_subscription_by_item(draft.clone())
                    .await?;
                Ok(Some(draft))
            }
            None => {
                // Not a subscription product (or a TEST ping): nothing to
                // apply, but the notification still counts as handled.
                info!("notification carries no subscription transaction");
                Ok(None)
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::audit_logs::MockAuditLogRepository;
    use crates::domain::repositories::entitlements::MockEntitlementRepository;
    use crates::domain::repositories::notification_logs::MockNotificationLogRepository;
    use crates::domain::repositories::transactions::MockTransactionRepository;
    use crates::domain::value_objects::enums::payment_item_types::PaymentItemType;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use crates::payments::apple::app_account_token::user_id_to_uuid;
    use crates::payments::apple::jws::TRANSACTION_TYPE_AUTO_RENEWABLE;

    fn encode_test_jws(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","x5c":[]}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    fn catalog() -> PaymentItemCatalog {
        PaymentItemCatalog::new(vec![PaymentItem {
            id: "vip_monthly".to_string(),
            provider_id: PaymentProvider::Apple,
            provider_item_id: "vip.high.month".to_string(),
            item_type: PaymentItemType::AutoRenewableSubscription,
            duration_hours: None,
        }])
    }

    fn webhook_body(renewal_status: i64, revocation_date: i64) -> String {
        let token = user_id_to_uuid("abc123").unwrap();
        let transaction = encode_test_jws(&serde_json::json!({
            "transactionId": "2000000123",
            "originalTransactionId": "2000000100",
            "productId": "vip.high.month",
            "bundleId": "com.example.app",
            "type": TRANSACTION_TYPE_AUTO_RENEWABLE,
            "appAccountToken": token,
            "purchaseDate": 1735689600000i64,
            "expiresDate": 1738368000000i64,
            "revocationDate": revocation_date,
            "price": 999,
            "currency": "USD",
        }));
        let renewal = encode_test_jws(&serde_json::json!({
            "originalTransactionId": "2000000100",
            "productId": "vip.high.month",
            "autoRenewStatus": renewal_status,
            "renewalDate": 1738368000000i64,
        }));
        let payload = encode_test_jws(&serde_json::json!({
            "notificationType": "DID_RENEW",
            "data": {
                "environment": "Production",
                "bundleId": "com.example.app",
                "signedTransactionInfo": transaction,
                "signedRenewalInfo": renewal,
            },
        }));

        serde_json::json!({ "signedPayload": payload }).to_string()
    }

    #[test]
    fn parser_maps_the_decoded_payload() {
        let parser =
            AppleNotificationParser::new(catalog(), &webhook_body(1, 0), Utc::now()).unwrap();

        let draft = parser.transaction().unwrap().unwrap();

        assert_eq!(draft.user_id, "abc123");
        assert_eq!(draft.provider_id, PaymentProvider::Apple);
        assert_eq!(draft.payment_item_id, "vip_monthly");
        assert_eq!(draft.transaction_id, "2000000123");
        assert_eq!(draft.price, 99_900);
        assert_eq!(
            draft.purchase_at,
            DateTime::from_timestamp_millis(1_735_689_600_000).unwrap()
        );
        assert_eq!(
            draft.auto_renew_expire_at,
            DateTime::from_timestamp_millis(1_738_368_000_000)
        );
        assert_eq!(
            draft.next_auto_renew_at,
            DateTime::from_timestamp_millis(1_738_368_000_000)
        );
        assert_eq!(
            draft.parent_transaction_id.as_deref(),
            Some("2000000100")
        );
        assert!(draft.refund_at.is_none());
        assert!(draft.extra.payment_item_snapshot.is_some());
    }

    #[test]
    fn parser_drops_next_renewal_when_auto_renew_is_off() {
        let parser =
            AppleNotificationParser::new(catalog(), &webhook_body(0, 0), Utc::now()).unwrap();

        let draft = parser.transaction().unwrap().unwrap();

        assert!(draft.next_auto_renew_at.is_none());
        // The chain parent still comes from the renewal info.
        assert_eq!(draft.parent_transaction_id.as_deref(), Some("2000000100"));
    }

    #[test]
    fn parser_maps_revocation_to_refund() {
        let parser = AppleNotificationParser::new(
            catalog(),
            &webhook_body(1, 1_736_000_000_000),
            Utc::now(),
        )
        .unwrap();

        let draft = parser.transaction().unwrap().unwrap();

        assert_eq!(
            draft.refund_at,
            DateTime::from_timestamp_millis(1_736_000_000_000)
        );
    }

    #[test]
    fn parser_rejects_malformed_bodies() {
        assert!(AppleNotificationParser::new(catalog(), "not json", Utc::now()).is_err());
        assert!(
            AppleNotificationParser::new(
                catalog(),
                &serde_json::json!({"signedPayload": "garbage"}).to_string(),
                Utc::now(),
            )
            .is_err()
        );
    }

    fn build_usecase(
        entitlement_repo: MockEntitlementRepository,
    ) -> NotificationIngestUseCase<
        MockEntitlementRepository,
        MockAuditLogRepository,
        MockTransactionRepository,
        MockNotificationLogRepository,
    > {
        let mut audit_repo = MockAuditLogRepository::new();
        audit_repo
            .expect_save_transaction_log()
            .returning(|_| Ok(()));
        audit_repo
            .expect_save_subscription_log()
            .returning(|_| Ok(()));

        let mut notification_logs = MockNotificationLogRepository::new();
        notification_logs.expect_save().returning(|_| Ok(()));

        let entitlements = Arc::new(EntitlementUseCase::new(
            Arc::new(entitlement_repo),
            Arc::new(audit_repo),
            Arc::new(MockTransactionRepository::new()),
            catalog(),
        ));

        NotificationIngestUseCase::new(catalog(), entitlements, Arc::new(notification_logs))
    }

    #[tokio::test]
    async fn rejects_unsupported_providers() {
        let usecase = build_usecase(MockEntitlementRepository::new());

        let err = usecase
            .handle_notification("stripe", &webhook_body(1, 0), "trace-1")
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::UnsupportedProvider(_)));
    }

    #[tokio::test]
    async fn applies_the_parsed_transaction() {
        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_apply_transaction()
            .withf(|draft, _| draft.transaction_id == "2000000123")
            .returning(|draft, _| {
                let now = Utc::now();
                Ok(crates::domain::value_objects::entitlements::EntitlementOutcome {
                    transaction_before: None,
                    transaction_after: crates::domain::entities::transactions::TransactionEntity {
                        id: uuid::Uuid::now_v7(),
                        user_id: draft.user_id.clone(),
                        provider_id: draft.provider_id.to_string(),
                        payment_item_id: draft.payment_item_id.clone(),
                        transaction_id: draft.transaction_id.clone(),
                        parent_transaction_id: draft.parent_transaction_id.clone(),
                        before_upgraded_transaction_id: None,
                        currency: draft.currency.clone(),
                        price: draft.price,
                        purchase_at: draft.purchase_at,
                        refund_at: draft.refund_at,
                        auto_renew_expire_at: draft.auto_renew_expire_at,
                        next_auto_renew_at: draft.next_auto_renew_at,
                        revocation_date: None,
                        revocation_reason: None,
                        extra: serde_json::json!({}),
                        created_at: now,
                        updated_at: now,
                    },
                    subscription_before: None,
                    subscription_after: crates::domain::entities::subscriptions::SubscriptionEntity {
                        id: uuid::Uuid::now_v7(),
                        user_id: draft.user_id.clone(),
                        status: "active".to_string(),
                        next_auto_renew_at: draft.next_auto_renew_at,
                        expire_at: draft.auto_renew_expire_at,
                        extra: serde_json::json!({}),
                        created_at: now,
                        updated_at: now,
                    },
                    periods: Vec::new(),
                    subscription_updated: false,
                })
            });

        let usecase = build_usecase(entitlement_repo);

        usecase
            .handle_notification("apple", &webhook_body(1, 0), "trace-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notifications_are_handled_without_state_change() {
        let payload = encode_test_jws(&serde_json::json!({ "notificationType": "TEST" }));
        let body = serde_json::json!({ "signedPayload": payload }).to_string();

        // No apply_transaction expectation: a call would fail the test.
        let usecase = build_usecase(MockEntitlementRepository::new());

        usecase
            .handle_notification("apple", &body, "trace-1")
            .await
            .unwrap();
    }
}
