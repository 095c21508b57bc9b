use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscription, transaction, user_membership_active_item},
    },
    tool::generate_uuid_v7,
};
use domain::{
    entities::{
        membership_active_items::UserMembershipActiveItemEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        transactions::{InsertTransactionEntity, TransactionDraft, TransactionEntity},
    },
    repositories::entitlements::EntitlementRepository,
    value_objects::{
        entitlements::EntitlementOutcome,
        enums::{
            change_reasons::SubscriptionChangeReason,
            subscription_statuses::SubscriptionStatus,
        },
        payment_items::PaymentItemCatalog,
        subscription_periods::{ActivePeriod, reconstruct_active_periods},
    },
};

pub struct EntitlementPostgres {
    db_pool: Arc<PgPoolSquad>,
    catalog: PaymentItemCatalog,
}

impl EntitlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>, catalog: PaymentItemCatalog) -> Self {
        Self { db_pool, catalog }
    }
}

#[async_trait]
impl EntitlementRepository for EntitlementPostgres {
    async fn apply_transaction(
        &self,
        draft: TransactionDraft,
        _reason: SubscriptionChangeReason,
    ) -> Result<EntitlementOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let catalog = self.catalog.clone();

        // Steps 2-6 of the entitlement write are all-or-nothing: the
        // transaction upsert, the derived-row rebuild, and the subscription
        // update either all land or none do. Serializable isolation makes
        // concurrent writes for the same user observe each other's ledger.
        conn.build_transaction()
            .serializable()
            .run(|conn| -> Result<EntitlementOutcome> {
                let now = Utc::now();

                let transaction_before = transaction::table
                    .filter(transaction::provider_id.eq(draft.provider_id.to_string()))
                    .filter(transaction::transaction_id.eq(&draft.transaction_id))
                    .first::<TransactionEntity>(conn)
                    .optional()?;

                let transaction_after =
                    upsert_transaction(conn, &draft, transaction_before.as_ref(), now)?;

                let user_transactions = transaction::table
                    .filter(transaction::user_id.eq(&draft.user_id))
                    .load::<TransactionEntity>(conn)?;

                let process_time = now.max(transaction_after.purchase_at);
                let periods =
                    reconstruct_active_periods(&user_transactions, &catalog, process_time)?;

                rebuild_membership_active_items(conn, &draft.user_id, &periods, now)?;

                let subscription_before = subscription::table
                    .filter(subscription::user_id.eq(&draft.user_id))
                    .first::<SubscriptionEntity>(conn)
                    .optional()?;

                let (subscription_after, subscription_updated) = upsert_subscription(
                    conn,
                    &draft.user_id,
                    subscription_before.as_ref(),
                    &periods,
                    process_time,
                    now,
                )?;

                Ok(EntitlementOutcome {
                    transaction_before,
                    transaction_after,
                    subscription_before,
                    subscription_after,
                    periods,
                    subscription_updated,
                })
            })
    }
}

fn upsert_transaction(
    conn: &mut PgConnection,
    draft: &TransactionDraft,
    original: Option<&TransactionEntity>,
    now: DateTime<Utc>,
) -> Result<TransactionEntity> {
    let mut extra = draft.extra.clone();

    let row = match original {
        Some(original) => {
            // Identity and first-observation facts survive re-observations.
            let original_extra = original.extra();
            extra.is_first_purchase = original_extra.is_first_purchase;
            extra.payment_item_snapshot = original_extra.payment_item_snapshot;

            InsertTransactionEntity {
                id: original.id,
                user_id: draft.user_id.clone(),
                provider_id: draft.provider_id.to_string(),
                payment_item_id: draft.payment_item_id.clone(),
                transaction_id: draft.transaction_id.clone(),
                parent_transaction_id: draft.parent_transaction_id.clone(),
                before_upgraded_transaction_id: draft.before_upgraded_transaction_id.clone(),
                currency: draft.currency.clone(),
                price: draft.price,
                purchase_at: draft.purchase_at,
                refund_at: draft.refund_at,
                auto_renew_expire_at: draft.auto_renew_expire_at,
                next_auto_renew_at: draft.next_auto_renew_at,
                revocation_date: draft.revocation_date,
                revocation_reason: draft.revocation_reason.clone(),
                extra: serde_json::to_value(&extra)?,
                created_at: original.created_at,
                updated_at: now,
            }
        }
        None => {
            let prior_count: i64 = transaction::table
                .filter(transaction::user_id.eq(&draft.user_id))
                .count()
                .get_result(conn)?;
            extra.is_first_purchase = prior_count == 0;

            InsertTransactionEntity {
                id: generate_uuid_v7(),
                user_id: draft.user_id.clone(),
                provider_id: draft.provider_id.to_string(),
                payment_item_id: draft.payment_item_id.clone(),
                transaction_id: draft.transaction_id.clone(),
                parent_transaction_id: draft.parent_transaction_id.clone(),
                before_upgraded_transaction_id: draft.before_upgraded_transaction_id.clone(),
                currency: draft.currency.clone(),
                price: draft.price,
                purchase_at: draft.purchase_at,
                refund_at: draft.refund_at,
                auto_renew_expire_at: draft.auto_renew_expire_at,
                next_auto_renew_at: draft.next_auto_renew_at,
                revocation_date: draft.revocation_date,
                revocation_reason: draft.revocation_reason.clone(),
                extra: serde_json::to_value(&extra)?,
                created_at: now,
                updated_at: now,
            }
        }
    };

    let saved = match original {
        Some(original) => diesel::update(transaction::table.filter(transaction::id.eq(original.id)))
            .set(&row)
            .get_result::<TransactionEntity>(conn)?,
        None => diesel::insert_into(transaction::table)
            .values(&row)
            .get_result::<TransactionEntity>(conn)?,
    };

    Ok(saved)
}

fn rebuild_membership_active_items(
    conn: &mut PgConnection,
    user_id: &str,
    periods: &[ActivePeriod],
    now: DateTime<Utc>,
) -> Result<()> {
    diesel::delete(
        user_membership_active_item::table.filter(user_membership_active_item::user_id.eq(user_id)),
    )
    .execute(conn)?;

    if periods.is_empty() {
        return Ok(());
    }

    let rows: Vec<UserMembershipActiveItemEntity> = periods
        .iter()
        .map(|period| period.to_membership_active_item(now))
        .collect();

    diesel::insert_into(user_membership_active_item::table)
        .values(&rows)
        .execute(conn)?;

    Ok(())
}

fn upsert_subscription(
    conn: &mut PgConnection,
    user_id: &str,
    before: Option<&SubscriptionEntity>,
    periods: &[ActivePeriod],
    process_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(SubscriptionEntity, bool)> {
    if periods.is_empty() {
        return match before {
            Some(before) => {
                let after = diesel::update(subscription::table.filter(subscription::id.eq(before.id)))
                    .set((
                        subscription::status.eq(SubscriptionStatus::Inactive.to_string()),
                        subscription::next_auto_renew_at.eq::<Option<DateTime<Utc>>>(None),
                        subscription::expire_at.eq::<Option<DateTime<Utc>>>(None),
                        subscription::updated_at.eq(now),
                    ))
                    .get_result::<SubscriptionEntity>(conn)?;
                let updated = before.valid() != after.valid();
                Ok((after, updated))
            }
            None => {
                // Nothing persisted yet and nothing to grant; report a
                // transient inactive state without creating a row.
                let after = SubscriptionEntity {
                    id: generate_uuid_v7(),
                    user_id: user_id.to_string(),
                    status: SubscriptionStatus::Inactive.to_string(),
                    next_auto_renew_at: None,
                    expire_at: None,
                    extra: serde_json::json!({}),
                    created_at: now,
                    updated_at: now,
                };
                Ok((after, false))
            }
        };
    }

    let expire_at = periods
        .last()
        .map(|period| period.expire_at)
        .unwrap_or(process_time);

    // Walk periods from the tail: the first one that carries a renewal time
    // decides, and only a future renewal time is kept.
    let mut next_auto_renew_at = None;
    for period in periods.iter().rev() {
        if let Some(next) = period.transaction.next_auto_renew_at {
            if next > process_time {
                next_auto_renew_at = Some(next);
            }
            break;
        }
    }

    let after = match before {
        Some(before) => diesel::update(subscription::table.filter(subscription::id.eq(before.id)))
            .set((
                subscription::status.eq(SubscriptionStatus::Active.to_string()),
                subscription::next_auto_renew_at.eq(next_auto_renew_at),
                subscription::expire_at.eq(Some(expire_at)),
                subscription::updated_at.eq(now),
            ))
            .get_result::<SubscriptionEntity>(conn)?,
        None => diesel::insert_into(subscription::table)
            .values(&InsertSubscriptionEntity {
                id: generate_uuid_v7(),
                user_id: user_id.to_string(),
                status: SubscriptionStatus::Active.to_string(),
                next_auto_renew_at,
                expire_at: Some(expire_at),
                extra: serde_json::json!({}),
                created_at: now,
                updated_at: now,
            })
            .get_result::<SubscriptionEntity>(conn)?,
    };

    let updated = match before {
        Some(before) => before.valid() != after.valid(),
        None => after.valid(),
    };

    Ok((after, updated))
}
