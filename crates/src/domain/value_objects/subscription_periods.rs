use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::membership_active_items::UserMembershipActiveItemEntity;
use crate::domain::entities::transactions::TransactionEntity;
use crate::domain::value_objects::enums::payment_item_types::PaymentItemType;
use crate::domain::value_objects::payment_items::{PaymentItem, PaymentItemCatalog};

/// A transaction together with the time window during which it confers
/// entitlement, after overlap and refund adjustments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivePeriod {
    #[serde(flatten)]
    pub transaction: TransactionEntity,
    /// Refunds and overlap shifts update this value.
    pub remaining_duration_seconds: i64,
    pub activated_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

impl ActivePeriod {
    pub fn to_membership_active_item(&self, now: DateTime<Utc>) -> UserMembershipActiveItemEntity {
        UserMembershipActiveItemEntity {
            id: self.transaction.id,
            user_transaction_id: self.transaction.id,
            user_id: self.transaction.user_id.clone(),
            payment_item_id: self.transaction.payment_item_id.clone(),
            remaining_duration_seconds: self.remaining_duration_seconds,
            activated_at: self.activated_at,
            expire_at: self.expire_at,
            next_auto_renew_at: self.transaction.next_auto_renew_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PeriodError {
    #[error("invalid query time: zero value")]
    InvalidQuery,
    #[error("payment item not found: {0}")]
    UnknownPaymentItem(String),
    #[error("auto renew expire time is missing for transaction: {0}")]
    MissingExpiry(String),
    #[error("unsupported payment item type for transaction: {0}")]
    UnsupportedItemType(String),
}

fn is_zero_instant(at: DateTime<Utc>) -> bool {
    at.timestamp() == 0 && at.timestamp_subsec_nanos() == 0
}

/// Drops transactions that were superseded by an upgrade visible at
/// `query_at`. Historical queries before the upgrade keep the old record.
fn filter_upgraded_transactions(
    transactions: &[TransactionEntity],
    query_at: DateTime<Utc>,
) -> Vec<TransactionEntity> {
    let mut upgraded_at: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for tx in transactions {
        if tx.purchase_at > query_at {
            continue;
        }
        if let Some(before_id) = tx.before_upgraded_transaction_id.as_deref() {
            upgraded_at
                .entry(before_id)
                .and_modify(|at| *at = (*at).max(tx.purchase_at))
                .or_insert(tx.purchase_at);
        }
    }

    transactions
        .iter()
        .filter(|tx| {
            upgraded_at
                .get(tx.transaction_id.as_str())
                .is_none_or(|upgrade_purchase_at| tx.purchase_at >= *upgrade_purchase_at)
        })
        .cloned()
        .collect()
}

fn process_non_renewable(
    mut result: Vec<ActivePeriod>,
    payment_item: &PaymentItem,
    transaction: TransactionEntity,
    query_at: DateTime<Utc>,
) -> Result<Vec<ActivePeriod>, PeriodError> {
    let duration_hours = payment_item
        .duration_hours
        .ok_or_else(|| PeriodError::UnknownPaymentItem(payment_item.id.clone()))?;

    let remaining_duration_seconds = duration_hours * 60 * 60;
    let mut activated_at = transaction.purchase_at;
    let mut expire_at = activated_at + Duration::seconds(remaining_duration_seconds);

    // A non-renewable subscription queues behind the list: when it was bought
    // before the last period expires, it activates at that expiry instead.
    if let Some(last) = result.last() {
        if transaction.purchase_at < last.expire_at {
            activated_at = last.expire_at;
            expire_at = activated_at + Duration::seconds(remaining_duration_seconds);
        }
    }

    // A refunded purchase whose window would still be open at query time was
    // never granted.
    if transaction.refund_at.is_some() && expire_at > query_at {
        return Ok(result);
    }

    result.push(ActivePeriod {
        transaction,
        remaining_duration_seconds,
        activated_at,
        expire_at,
    });
    Ok(result)
}

fn process_auto_renewable(
    mut result: Vec<ActivePeriod>,
    transaction: TransactionEntity,
    query_at: DateTime<Utc>,
) -> Result<Vec<ActivePeriod>, PeriodError> {
    let auto_renew_expire_at = transaction
        .auto_renew_expire_at
        .ok_or_else(|| PeriodError::MissingExpiry(transaction.transaction_id.clone()))?;

    if transaction.refund_at.is_some() && auto_renew_expire_at > query_at {
        return Ok(result);
    }

    let activated_at = transaction.purchase_at;
    let expire_at = auto_renew_expire_at;
    let remaining_duration_seconds = (expire_at - transaction.purchase_at).num_seconds();

    let period = ActivePeriod {
        transaction,
        remaining_duration_seconds,
        activated_at,
        expire_at,
    };

    // Auto-renewable periods take precedence over overlapping entries already
    // in the list: the first overlapped period is truncated to its unused
    // remainder and re-anchored after the new one, the rest cascade.
    let insert_index = result
        .iter()
        .position(|existing| existing.expire_at > period.transaction.purchase_at);

    match insert_index {
        None => result.push(period),
        Some(insert_index) => {
            for index in insert_index..result.len() {
                if index == insert_index {
                    let remaining = result[index].expire_at - period.transaction.purchase_at;
                    result[index].remaining_duration_seconds = remaining.num_seconds();
                    result[index].activated_at = period.expire_at;
                    result[index].expire_at = result[index].activated_at + remaining;
                } else {
                    result[index].activated_at = result[index - 1].expire_at;
                    result[index].expire_at = result[index].activated_at
                        + Duration::seconds(result[index].remaining_duration_seconds);
                }
            }
            result.insert(insert_index, period);
        }
    }

    Ok(result)
}

/// Keeps only the trailing contiguous run of periods, then trims refunded
/// entries off its tail.
fn select_last_active_periods(periods: Vec<ActivePeriod>) -> Vec<ActivePeriod> {
    if periods.is_empty() {
        return periods;
    }

    let mut run_start = 0;
    for index in 1..periods.len() {
        if periods[index].activated_at != periods[index - 1].expire_at {
            run_start = index;
        }
    }

    let mut result: Vec<ActivePeriod> = periods.into_iter().skip(run_start).collect();

    while result
        .last()
        .is_some_and(|period| period.transaction.refund_at.is_some())
    {
        result.pop();
    }

    result
}

/// Folds a user's transactions into the ordered list of periods active at
/// `query_at`. Pure and deterministic: permutations of the input produce the
/// same output.
pub fn reconstruct_active_periods(
    transactions: &[TransactionEntity],
    catalog: &PaymentItemCatalog,
    query_at: DateTime<Utc>,
) -> Result<Vec<ActivePeriod>, PeriodError> {
    if is_zero_instant(query_at) {
        return Err(PeriodError::InvalidQuery);
    }

    if transactions.is_empty() {
        return Ok(Vec::new());
    }

    let mut transactions = filter_upgraded_transactions(transactions, query_at);
    transactions.sort_by_key(|tx| tx.purchase_at);

    let mut result: Vec<ActivePeriod> = Vec::new();

    for transaction in transactions {
        if transaction.purchase_at > query_at {
            break;
        }

        let payment_item = match transaction.payment_item_snapshot() {
            Some(snapshot) => snapshot,
            None => catalog
                .get_by_id(&transaction.payment_item_id)
                .cloned()
                .ok_or_else(|| {
                    PeriodError::UnknownPaymentItem(transaction.payment_item_id.clone())
                })?,
        };

        result = match payment_item.item_type {
            PaymentItemType::NonRenewableSubscription => {
                process_non_renewable(result, &payment_item, transaction, query_at)?
            }
            PaymentItemType::AutoRenewableSubscription => {
                process_auto_renewable(result, transaction, query_at)?
            }
        };
    }

    Ok(select_last_active_periods(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::payment_providers::PaymentProvider;
    use uuid::Uuid;

    const DAY: i64 = 24 * 60 * 60;

    fn catalog() -> PaymentItemCatalog {
        PaymentItemCatalog::new(vec![
            PaymentItem {
                id: "payment1".to_string(),
                provider_id: PaymentProvider::Apple,
                provider_item_id: "card.30d".to_string(),
                item_type: PaymentItemType::NonRenewableSubscription,
                duration_hours: Some(30 * 24),
            },
            PaymentItem {
                id: "payment2".to_string(),
                provider_id: PaymentProvider::Apple,
                provider_item_id: "vip.month".to_string(),
                item_type: PaymentItemType::AutoRenewableSubscription,
                duration_hours: None,
            },
            PaymentItem {
                id: "payment3".to_string(),
                provider_id: PaymentProvider::Apple,
                provider_item_id: "card.30d.alt".to_string(),
                item_type: PaymentItemType::NonRenewableSubscription,
                duration_hours: Some(30 * 24),
            },
        ])
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_735_689_600, 0).unwrap() // 2025-01-01T00:00:00Z
    }

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    fn tx(id: Uuid, payment_item_id: &str, purchase_at: DateTime<Utc>) -> TransactionEntity {
        TransactionEntity {
            id,
            user_id: "user-1".to_string(),
            provider_id: "apple".to_string(),
            payment_item_id: payment_item_id.to_string(),
            transaction_id: id.to_string(),
            parent_transaction_id: None,
            before_upgraded_transaction_id: None,
            currency: "USD".to_string(),
            price: 999,
            purchase_at,
            refund_at: None,
            auto_renew_expire_at: None,
            next_auto_renew_at: None,
            revocation_date: None,
            revocation_reason: None,
            extra: serde_json::json!({}),
            created_at: purchase_at,
            updated_at: purchase_at,
        }
    }

    fn assert_period(
        period: &ActivePeriod,
        id: Uuid,
        activated_at: DateTime<Utc>,
        expire_at: DateTime<Utc>,
        remaining_seconds: i64,
    ) {
        assert_eq!(period.transaction.id, id);
        assert_eq!(period.activated_at, activated_at);
        assert_eq!(period.expire_at, expire_at);
        assert_eq!(period.remaining_duration_seconds, remaining_seconds);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let periods = reconstruct_active_periods(&[], &catalog(), now()).unwrap();
        assert!(periods.is_empty());
    }

    #[test]
    fn zero_query_time_is_rejected() {
        let zero = DateTime::from_timestamp(0, 0).unwrap();
        let err = reconstruct_active_periods(&[], &catalog(), zero).unwrap_err();
        assert_eq!(err, PeriodError::InvalidQuery);
    }

    #[test]
    fn unknown_payment_item_is_rejected() {
        let id = Uuid::now_v7();
        let txs = vec![tx(id, "missing", now())];
        let err = reconstruct_active_periods(&txs, &catalog(), now() + days(1)).unwrap_err();
        assert_eq!(err, PeriodError::UnknownPaymentItem("missing".to_string()));
    }

    #[test]
    fn auto_renewable_without_expiry_is_rejected() {
        let id = Uuid::now_v7();
        let txs = vec![tx(id, "payment2", now())];
        let err = reconstruct_active_periods(&txs, &catalog(), now() + days(1)).unwrap_err();
        assert!(matches!(err, PeriodError::MissingExpiry(_)));
    }

    #[test]
    fn single_non_renewable_subscription() {
        let id = Uuid::now_v7();
        let txs = vec![tx(id, "payment1", now())];

        let periods = reconstruct_active_periods(&txs, &catalog(), now() + days(15)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id, now(), now() + days(30), 30 * DAY);
    }

    #[test]
    fn single_auto_renewable_subscription() {
        let id = Uuid::now_v7();
        let mut t = tx(id, "payment2", now());
        t.auto_renew_expire_at = Some(now() + days(30));

        let periods = reconstruct_active_periods(&[t], &catalog(), now() + days(15)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id, now(), now() + days(30), 30 * DAY);
    }

    #[test]
    fn auto_renewable_interrupts_overlapping_non_renewable() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let card = tx(id1, "payment1", now());
        let mut vip = tx(id2, "payment2", now() + days(15));
        vip.auto_renew_expire_at = Some(now() + days(45));

        let periods =
            reconstruct_active_periods(&[card, vip], &catalog(), now() + days(20)).unwrap();

        assert_eq!(periods.len(), 2);
        assert_period(&periods[0], id2, now() + days(15), now() + days(45), 30 * DAY);
        // Remaining duration of the card shrinks to the unused part.
        assert_period(&periods[1], id1, now() + days(45), now() + days(60), 15 * DAY);
    }

    #[test]
    fn refunded_non_renewable_before_expiry_is_skipped() {
        let id = Uuid::now_v7();
        let mut t = tx(id, "payment1", now());
        t.refund_at = Some(now() + days(5));

        let periods = reconstruct_active_periods(&[t], &catalog(), now() + days(15)).unwrap();
        assert!(periods.is_empty());
    }

    #[test]
    fn refund_after_expiry_keeps_the_elapsed_period() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let mut first = tx(id1, "payment1", now());
        first.refund_at = Some(now() + days(32));
        let second = tx(id2, "payment1", now() + Duration::hours(4));

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(35)).unwrap();

        assert_eq!(periods.len(), 2);
        assert_period(&periods[0], id1, now(), now() + days(30), 30 * DAY);
        assert_period(&periods[1], id2, now() + days(30), now() + days(60), 30 * DAY);
    }

    #[test]
    fn refunded_tail_is_trimmed() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let first = tx(id1, "payment1", now());
        let mut second = tx(id2, "payment1", now() + Duration::hours(4));
        second.refund_at = Some(now() + Duration::hours(5));

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(35)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id1, now(), now() + days(30), 30 * DAY);
    }

    #[test]
    fn refunded_auto_renewable_is_skipped_while_window_open() {
        let id = Uuid::now_v7();
        let mut t = tx(id, "payment2", now());
        t.auto_renew_expire_at = Some(now() + days(30));
        t.refund_at = Some(now() + Duration::hours(5));

        let periods =
            reconstruct_active_periods(std::slice::from_ref(&t), &catalog(), now() + Duration::hours(7))
                .unwrap();
        assert!(periods.is_empty());

        // Once the window is fully in the past it still contributes nothing:
        // it would be the sole (refunded) tail of its run.
        let periods = reconstruct_active_periods(&[t], &catalog(), now() + days(60)).unwrap();
        assert!(periods.is_empty());
    }

    #[test]
    fn refunded_renewal_keeps_the_earlier_period() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let mut first = tx(id1, "payment2", now() - days(30));
        first.auto_renew_expire_at = Some(now());
        let mut second = tx(id2, "payment2", now());
        second.auto_renew_expire_at = Some(now() + days(30));
        second.refund_at = Some(now() + Duration::hours(5));

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(60)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id1, now() - days(30), now(), 30 * DAY);
    }

    #[test]
    fn consecutive_non_renewables_queue_without_gap() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let first = tx(id1, "payment1", now());
        let second = tx(id2, "payment1", now() + days(15));

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(40)).unwrap();

        assert_eq!(periods.len(), 2);
        assert_period(&periods[0], id1, now(), now() + days(30), 30 * DAY);
        assert_period(&periods[1], id2, now() + days(30), now() + days(60), 30 * DAY);
    }

    #[test]
    fn gap_starts_a_new_contiguous_run() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let first = tx(id1, "payment1", now());
        let second = tx(id2, "payment1", now() + days(60));

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(70)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id2, now() + days(60), now() + days(90), 30 * DAY);
    }

    #[test]
    fn back_to_back_renewals_before_first_expiry() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let mut first = tx(id1, "payment2", now());
        first.auto_renew_expire_at = Some(now() + days(30));
        let mut second = tx(id2, "payment2", now() + days(30));
        second.auto_renew_expire_at = Some(now() + days(60));

        let periods = reconstruct_active_periods(
            &[first.clone(), second.clone()],
            &catalog(),
            now() + days(20),
        )
        .unwrap();
        assert_eq!(periods.len(), 1);
        assert_period(&periods[0], id1, now(), now() + days(30), 30 * DAY);

        let periods =
            reconstruct_active_periods(&[first, second], &catalog(), now() + days(35)).unwrap();
        assert_eq!(periods.len(), 2);
        assert_period(&periods[0], id1, now(), now() + days(30), 30 * DAY);
        assert_period(&periods[1], id2, now() + days(30), now() + days(60), 30 * DAY);
    }

    #[test]
    fn multiple_overlapping_subscriptions_cascade() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let id3 = Uuid::now_v7();
        let card = tx(id1, "payment1", now());
        let mut vip = tx(id2, "payment2", now() + days(10));
        vip.auto_renew_expire_at = Some(now() + days(40));
        let card2 = tx(id3, "payment3", now() + days(20));

        let periods =
            reconstruct_active_periods(&[card, vip, card2], &catalog(), now() + days(25)).unwrap();

        assert_eq!(periods.len(), 3);
        assert_period(&periods[0], id2, now() + days(10), now() + days(40), 30 * DAY);
        assert_period(&periods[1], id1, now() + days(40), now() + days(60), 20 * DAY);
        assert_period(&periods[2], id3, now() + days(60), now() + days(90), 30 * DAY);
    }

    #[test]
    fn earlier_run_is_dropped_when_a_later_run_overlaps_query() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let id3 = Uuid::now_v7();
        let id4 = Uuid::now_v7();
        let id5 = Uuid::now_v7();
        let id6 = Uuid::now_v7();
        let base = now() + days(100);

        let card = tx(id1, "payment1", now());
        let mut vip = tx(id2, "payment2", now() + days(10));
        vip.auto_renew_expire_at = Some(now() + days(40));
        let card2 = tx(id3, "payment3", now() + days(20));

        let card_late = tx(id4, "payment1", base);
        let mut vip_late = tx(id5, "payment2", base + days(10));
        vip_late.auto_renew_expire_at = Some(base + days(40));
        let card2_late = tx(id6, "payment3", base + days(20));

        let periods = reconstruct_active_periods(
            &[card, vip, card2, card_late, vip_late, card2_late],
            &catalog(),
            base + days(25),
        )
        .unwrap();

        assert_eq!(periods.len(), 3);
        assert_period(&periods[0], id5, base + days(10), base + days(40), 30 * DAY);
        assert_period(&periods[1], id4, base + days(40), base + days(60), 20 * DAY);
        assert_period(&periods[2], id6, base + days(60), base + days(90), 30 * DAY);
    }

    #[test]
    fn permutation_of_input_produces_identical_output() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let id3 = Uuid::now_v7();
        let card = tx(id1, "payment1", now());
        let mut vip = tx(id2, "payment2", now() + days(10));
        vip.auto_renew_expire_at = Some(now() + days(40));
        let card2 = tx(id3, "payment3", now() + days(20));

        let query_at = now() + days(25);
        let forward = reconstruct_active_periods(
            &[card.clone(), vip.clone(), card2.clone()],
            &catalog(),
            query_at,
        )
        .unwrap();
        let backward =
            reconstruct_active_periods(&[card2, vip, card], &catalog(), query_at).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn periods_are_time_contiguous() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let id3 = Uuid::now_v7();
        let card = tx(id1, "payment1", now());
        let mut vip = tx(id2, "payment2", now() + days(10));
        vip.auto_renew_expire_at = Some(now() + days(40));
        let card2 = tx(id3, "payment3", now() + days(20));

        let periods =
            reconstruct_active_periods(&[card, vip, card2], &catalog(), now() + days(25)).unwrap();

        for pair in periods.windows(2) {
            assert_eq!(pair[1].activated_at, pair[0].expire_at);
        }
    }

    #[test]
    fn snapshot_wins_over_catalog() {
        let id = Uuid::now_v7();
        let mut t = tx(id, "not_in_catalog", now());
        t.extra = serde_json::json!({
            "payment_item_snapshot": {
                "id": "not_in_catalog",
                "provider_id": "apple",
                "provider_item_id": "card.7d",
                "type": "non_renewable_subscription",
                "duration_hours": 7 * 24,
            },
            "is_first_purchase": false,
        });

        let periods = reconstruct_active_periods(&[t], &catalog(), now() + days(1)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].expire_at, now() + days(7));
    }

    #[test]
    fn upgraded_transaction_is_superseded() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let mut old = tx(id1, "payment2", now());
        old.transaction_id = "tx-old".to_string();
        old.auto_renew_expire_at = Some(now() + days(30));
        let mut new = tx(id2, "payment2", now() + days(10));
        new.transaction_id = "tx-new".to_string();
        new.auto_renew_expire_at = Some(now() + days(40));
        new.before_upgraded_transaction_id = Some("tx-old".to_string());

        let periods =
            reconstruct_active_periods(&[old, new], &catalog(), now() + days(20)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].transaction.id, id2);
        assert_eq!(periods[0].activated_at, now() + days(10));
        assert_eq!(periods[0].expire_at, now() + days(40));
    }

    #[test]
    fn upgrade_does_not_affect_historical_queries() {
        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let mut old = tx(id1, "payment2", now());
        old.transaction_id = "tx-old".to_string();
        old.auto_renew_expire_at = Some(now() + days(30));
        let mut new = tx(id2, "payment2", now() + days(10));
        new.transaction_id = "tx-new".to_string();
        new.auto_renew_expire_at = Some(now() + days(40));
        new.before_upgraded_transaction_id = Some("tx-old".to_string());

        let periods =
            reconstruct_active_periods(&[old, new], &catalog(), now() + days(5)).unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].transaction.id, id1);
        assert_eq!(periods[0].expire_at, now() + days(30));
    }

    #[test]
    fn converts_to_membership_active_item() {
        let id = Uuid::now_v7();
        let mut t = tx(id, "payment2", now());
        t.next_auto_renew_at = Some(now() + days(30));
        let period = ActivePeriod {
            transaction: t,
            remaining_duration_seconds: 30 * DAY,
            activated_at: now(),
            expire_at: now() + days(30),
        };

        let written_at = now() + days(1);
        let item = period.to_membership_active_item(written_at);

        assert_eq!(item.id, id);
        assert_eq!(item.user_transaction_id, id);
        assert_eq!(item.user_id, "user-1");
        assert_eq!(item.payment_item_id, "payment2");
        assert_eq!(item.remaining_duration_seconds, 30 * DAY);
        assert_eq!(item.activated_at, now());
        assert_eq!(item.expire_at, now() + days(30));
        assert_eq!(item.next_auto_renew_at, Some(now() + days(30)));
        assert_eq!(item.created_at, written_at);
    }
}
