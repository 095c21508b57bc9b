use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::{
            audit_logs::{SubscriptionLogEntity, TransactionLogEntity},
            transactions::{TransactionDraft, TransactionExtra},
        },
        repositories::{
            audit_logs::AuditLogRepository, entitlements::EntitlementRepository,
            transactions::TransactionRepository,
        },
        value_objects::{
            entitlements::EntitlementOutcome,
            enums::{
                change_reasons::SubscriptionChangeReason, payment_providers::PaymentProvider,
            },
            payment_items::PaymentItemCatalog,
            subscription_periods::{ActivePeriod, PeriodError, reconstruct_active_periods},
        },
    },
    tool::generate_uuid_v7,
};
use thiserror::Error;
use tracing::{error, info};

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, API_CODE_ERROR};

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("payment item not found: {0}")]
    UnknownPaymentItem(String),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn api_code(&self) -> i32 {
        match self {
            EntitlementError::BadRequest(_) => API_CODE_BAD_REQUEST,
            _ => API_CODE_ERROR,
        }
    }
}

/// Derives why this transaction changes the user's subscription state.
pub fn change_reason(
    catalog: &PaymentItemCatalog,
    draft: &TransactionDraft,
) -> Result<SubscriptionChangeReason, EntitlementError> {
    if draft.refund_at.is_some() {
        return Ok(SubscriptionChangeReason::Refund);
    }
    if draft.before_upgraded_transaction_id.is_some() {
        return Ok(SubscriptionChangeReason::Upgrade);
    }

    let payment_item = match draft.payment_item_snapshot() {
        Some(snapshot) => snapshot.clone(),
        None => catalog
            .get_by_id(&draft.payment_item_id)
            .cloned()
            .ok_or_else(|| EntitlementError::UnknownPaymentItem(draft.payment_item_id.clone()))?,
    };

    if payment_item.renewable() && !draft.is_auto_renewable() {
        return Ok(SubscriptionChangeReason::CancelRenew);
    }

    if draft.provider_id == PaymentProvider::Inner {
        return Ok(SubscriptionChangeReason::Gift);
    }

    Ok(SubscriptionChangeReason::Purchase)
}

/// Applies transactions to the per-user subscription state and serves the
/// derived period reads.
pub struct EntitlementUseCase<E, A, T>
where
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
    T: TransactionRepository + 'static,
{
    entitlement_repo: Arc<E>,
    audit_repo: Arc<A>,
    transaction_repo: Arc<T>,
    catalog: PaymentItemCatalog,
}

impl<E, A, T> EntitlementUseCase<E, A, T>
where
    E: EntitlementRepository + 'static,
    A: AuditLogRepository + 'static,
    T: TransactionRepository + 'static,
{
    pub fn new(
        entitlement_repo: Arc<E>,
        audit_repo: Arc<A>,
        transaction_repo: Arc<T>,
        catalog: PaymentItemCatalog,
    ) -> Self {
        Self {
            entitlement_repo,
            audit_repo,
            transaction_repo,
            catalog,
        }
    }

    pub fn catalog(&self) -> &PaymentItemCatalog {
        &self.catalog
    }

    /// Single entry point for all state-changing observations: webhook
    /// notifications, client verifications, and gifts all land here.
    pub async fn upsert_user_subscription_by_item(
        &self,
        draft: TransactionDraft,
    ) -> Result<EntitlementOutcome, EntitlementError> {
        let reason = change_reason(&self.catalog, &draft)?;

        let outcome = self
            .entitlement_repo
            .apply_transaction(draft, reason)
            .await?;

        info!(
            user_id = %outcome.transaction_after.user_id,
            transaction_id = %outcome.transaction_after.transaction_id,
            reason = %reason,
            "upsert user subscription by item"
        );

        if outcome.transaction_created() && reason == SubscriptionChangeReason::Refund {
            error!(
                provider_id = %outcome.transaction_after.provider_id,
                transaction_id = %outcome.transaction_after.transaction_id,
                user_id = %outcome.transaction_after.user_id,
                "refund observed for a transaction that was never recorded"
            );
        }

        self.write_audit_logs(&outcome, reason);

        if outcome.subscription_updated {
            self.handle_subscription_change(&outcome, reason);
        }

        Ok(outcome)
    }

    /// Grants an internal gift (for example a free membership card).
    pub async fn send_free_gift(
        &self,
        user_id: &str,
        payment_item_id: &str,
        operator_id: &str,
    ) -> Result<(), EntitlementError> {
        if user_id.is_empty() || payment_item_id.is_empty() {
            return Err(EntitlementError::BadRequest(
                "user_id and payment_item_id are required".to_string(),
            ));
        }

        let payment_item = self
            .catalog
            .get_by_id(payment_item_id)
            .cloned()
            .ok_or_else(|| EntitlementError::UnknownPaymentItem(payment_item_id.to_string()))?;

        let draft = TransactionDraft {
            user_id: user_id.to_string(),
            provider_id: PaymentProvider::Inner,
            payment_item_id: payment_item_id.to_string(),
            transaction_id: generate_uuid_v7().to_string(),
            parent_transaction_id: None,
            before_upgraded_transaction_id: None,
            currency: String::new(),
            price: 0,
            purchase_at: Utc::now(),
            refund_at: None,
            auto_renew_expire_at: None,
            next_auto_renew_at: None,
            revocation_date: None,
            revocation_reason: None,
            extra: TransactionExtra {
                operator_id: Some(operator_id.to_string()),
                payment_item_snapshot: Some(payment_item),
                is_first_purchase: false,
            },
        };

        self.upsert_user_subscription_by_item(draft).await?;
        Ok(())
    }

    /// Read path: the user's active periods at `query_at`.
    pub async fn get_user_active_subscription_items(
        &self,
        user_id: &str,
        query_at: DateTime<Utc>,
    ) -> Result<Vec<ActivePeriod>, EntitlementError> {
        let transactions = self.transaction_repo.list_user_transactions(user_id).await?;
        let periods = reconstruct_active_periods(&transactions, &self.catalog, query_at)?;
        Ok(periods)
    }

    /// Queues the audit rows after the write transaction committed. Losing a
    /// log row is tolerated and logged.
    fn write_audit_logs(&self, outcome: &EntitlementOutcome, reason: SubscriptionChangeReason) {
        let audit_repo = Arc::clone(&self.audit_repo);
        let now = Utc::now();

        let transaction_log = TransactionLogEntity {
            id: generate_uuid_v7(),
            user_id: outcome.transaction_after.user_id.clone(),
            payment_item_id: outcome.transaction_after.payment_item_id.clone(),
            provider_id: outcome.transaction_after.provider_id.clone(),
            transaction_id: outcome.transaction_after.transaction_id.clone(),
            reason: reason.to_string(),
            before: outcome
                .transaction_before
                .as_ref()
                .and_then(|before| serde_json::to_value(before).ok()),
            after: serde_json::to_value(&outcome.transaction_after)
                .unwrap_or(serde_json::Value::Null),
            extra: serde_json::json!({}),
            created_at: now,
        };

        let subscription_log = SubscriptionLogEntity {
            id: generate_uuid_v7(),
            user_id: outcome.subscription_after.user_id.clone(),
            reason: reason.to_string(),
            before: outcome
                .subscription_before
                .as_ref()
                .and_then(|before| serde_json::to_value(before).ok()),
            after: serde_json::to_value(&outcome.subscription_after)
                .unwrap_or(serde_json::Value::Null),
            extra: serde_json::json!({}),
            created_at: now,
        };

        tokio::spawn(async move {
            if let Err(err) = audit_repo.save_transaction_log(transaction_log).await {
                error!("failed to save transaction log: {err}");
            }
            if let Err(err) = audit_repo.save_subscription_log(subscription_log).await {
                error!("failed to save subscription log: {err}");
            }
        });
    }

    /// Business hook, fired only when the write flipped subscription
    /// validity.
    fn handle_subscription_change(
        &self,
        outcome: &EntitlementOutcome,
        reason: SubscriptionChangeReason,
    ) {
        info!(
            user_id = %outcome.subscription_after.user_id,
            status = %outcome.subscription_after.status,
            reason = %reason,
            "subscription validity changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::entities::subscriptions::SubscriptionEntity;
    use crates::domain::entities::transactions::TransactionEntity;
    use crates::domain::repositories::audit_logs::MockAuditLogRepository;
    use crates::domain::repositories::entitlements::MockEntitlementRepository;
    use crates::domain::repositories::transactions::MockTransactionRepository;
    use crates::domain::value_objects::enums::payment_item_types::PaymentItemType;
    use crates::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
    use crates::domain::value_objects::payment_items::PaymentItem;
    use uuid::Uuid;

    fn catalog() -> PaymentItemCatalog {
        PaymentItemCatalog::new(vec![
            PaymentItem {
                id: "vip_monthly".to_string(),
                provider_id: PaymentProvider::Apple,
                provider_item_id: "vip.month".to_string(),
                item_type: PaymentItemType::AutoRenewableSubscription,
                duration_hours: None,
            },
            PaymentItem {
                id: "card_30d".to_string(),
                provider_id: PaymentProvider::Inner,
                provider_item_id: "card.30d".to_string(),
                item_type: PaymentItemType::NonRenewableSubscription,
                duration_hours: Some(30 * 24),
            },
        ])
    }

    fn draft(payment_item_id: &str, provider_id: PaymentProvider) -> TransactionDraft {
        TransactionDraft {
            user_id: "user-1".to_string(),
            provider_id,
            payment_item_id: payment_item_id.to_string(),
            transaction_id: "tx-1".to_string(),
            parent_transaction_id: None,
            before_upgraded_transaction_id: None,
            currency: "USD".to_string(),
            price: 999,
            purchase_at: Utc::now(),
            refund_at: None,
            auto_renew_expire_at: None,
            next_auto_renew_at: None,
            revocation_date: None,
            revocation_reason: None,
            extra: TransactionExtra::default(),
        }
    }

    fn sample_outcome(draft: &TransactionDraft) -> EntitlementOutcome {
        let now = Utc::now();
        let transaction_after = TransactionEntity {
            id: Uuid::now_v7(),
            user_id: draft.user_id.clone(),
            provider_id: draft.provider_id.to_string(),
            payment_item_id: draft.payment_item_id.clone(),
            transaction_id: draft.transaction_id.clone(),
            parent_transaction_id: None,
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
        };
        let subscription_after = SubscriptionEntity {
            id: Uuid::now_v7(),
            user_id: draft.user_id.clone(),
            status: SubscriptionStatus::Active.to_string(),
            next_auto_renew_at: None,
            expire_at: Some(now + chrono::Duration::days(30)),
            extra: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };
        EntitlementOutcome {
            transaction_before: None,
            transaction_after,
            subscription_before: None,
            subscription_after,
            periods: Vec::new(),
            subscription_updated: false,
        }
    }

    #[test]
    fn refund_wins_over_other_reasons() {
        let mut draft = draft("vip_monthly", PaymentProvider::Apple);
        draft.refund_at = Some(Utc::now());
        draft.before_upgraded_transaction_id = Some("tx-0".to_string());

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::Refund);
    }

    #[test]
    fn upgrade_reason_follows_refund() {
        let mut draft = draft("vip_monthly", PaymentProvider::Apple);
        draft.before_upgraded_transaction_id = Some("tx-0".to_string());

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::Upgrade);
    }

    #[test]
    fn renewable_without_next_renewal_is_cancel_renew() {
        let draft = draft("vip_monthly", PaymentProvider::Apple);

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::CancelRenew);
    }

    #[test]
    fn inner_provider_is_gift() {
        let draft = draft("card_30d", PaymentProvider::Inner);

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::Gift);
    }

    #[test]
    fn everything_else_is_purchase() {
        let mut draft = draft("vip_monthly", PaymentProvider::Apple);
        draft.next_auto_renew_at = Some(Utc::now());

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::Purchase);
    }

    #[test]
    fn unknown_item_without_snapshot_fails() {
        let draft = draft("missing", PaymentProvider::Apple);

        let err = change_reason(&catalog(), &draft).unwrap_err();
        assert!(matches!(err, EntitlementError::UnknownPaymentItem(_)));
    }

    #[test]
    fn snapshot_resolves_items_missing_from_catalog() {
        let mut draft = draft("missing", PaymentProvider::Apple);
        draft.extra.payment_item_snapshot = Some(PaymentItem {
            id: "missing".to_string(),
            provider_id: PaymentProvider::Apple,
            provider_item_id: "gone.product".to_string(),
            item_type: PaymentItemType::NonRenewableSubscription,
            duration_hours: Some(24),
        });

        let reason = change_reason(&catalog(), &draft).unwrap();
        assert_eq!(reason, SubscriptionChangeReason::Purchase);
    }

    #[tokio::test]
    async fn upsert_passes_derived_reason_to_repository() {
        let input = {
            let mut d = draft("vip_monthly", PaymentProvider::Apple);
            d.next_auto_renew_at = Some(Utc::now());
            d
        };
        let outcome = sample_outcome(&input);

        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_apply_transaction()
            .withf(|_, reason| *reason == SubscriptionChangeReason::Purchase)
            .return_once(move |_, _| Ok(outcome));

        let mut audit_repo = MockAuditLogRepository::new();
        audit_repo
            .expect_save_transaction_log()
            .returning(|_| Ok(()));
        audit_repo
            .expect_save_subscription_log()
            .returning(|_| Ok(()));

        let usecase = EntitlementUseCase::new(
            Arc::new(entitlement_repo),
            Arc::new(audit_repo),
            Arc::new(MockTransactionRepository::new()),
            catalog(),
        );

        let result = usecase.upsert_user_subscription_by_item(input).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn gift_synthesizes_an_inner_transaction_with_snapshot() {
        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_apply_transaction()
            .withf(|draft, reason| {
                draft.provider_id == PaymentProvider::Inner
                    && draft.extra.operator_id.as_deref() == Some("op-9")
                    && draft
                        .extra
                        .payment_item_snapshot
                        .as_ref()
                        .is_some_and(|item| item.id == "card_30d")
                    && !draft.transaction_id.is_empty()
                    && *reason == SubscriptionChangeReason::Gift
            })
            .returning(|draft, _| Ok(sample_outcome(&draft)));

        let mut audit_repo = MockAuditLogRepository::new();
        audit_repo
            .expect_save_transaction_log()
            .returning(|_| Ok(()));
        audit_repo
            .expect_save_subscription_log()
            .returning(|_| Ok(()));

        let usecase = EntitlementUseCase::new(
            Arc::new(entitlement_repo),
            Arc::new(audit_repo),
            Arc::new(MockTransactionRepository::new()),
            catalog(),
        );

        usecase
            .send_free_gift("user-1", "card_30d", "op-9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn gift_requires_user_and_item() {
        let usecase = EntitlementUseCase::new(
            Arc::new(MockEntitlementRepository::new()),
            Arc::new(MockAuditLogRepository::new()),
            Arc::new(MockTransactionRepository::new()),
            catalog(),
        );

        let err = usecase.send_free_gift("", "card_30d", "op-9").await.unwrap_err();
        assert!(matches!(err, EntitlementError::BadRequest(_)));

        let err = usecase.send_free_gift("user-1", "", "op-9").await.unwrap_err();
        assert!(matches!(err, EntitlementError::BadRequest(_)));

        let err = usecase
            .send_free_gift("user-1", "unknown", "op-9")
            .await
            .unwrap_err();
        assert!(matches!(err, EntitlementError::UnknownPaymentItem(_)));
    }

    #[tokio::test]
    async fn read_path_folds_the_user_ledger() {
        let mut transaction_repo = MockTransactionRepository::new();
        transaction_repo
            .expect_list_user_transactions()
            .returning(|_| Ok(Vec::new()));

        let usecase = EntitlementUseCase::new(
            Arc::new(MockEntitlementRepository::new()),
            Arc::new(MockAuditLogRepository::new()),
            Arc::new(transaction_repo),
            catalog(),
        );

        let periods = usecase
            .get_user_active_subscription_items("user-1", Utc::now())
            .await
            .unwrap();
        assert!(periods.is_empty());
    }
}
