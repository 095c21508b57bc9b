use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::entities::daily_snapshots::SubscriptionDailySnapshotEntity;
use crates::domain::repositories::snapshots::SnapshotRepository;
use crates::tool::generate_uuid_v7;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

/// Takes one snapshot of every subscription row for the given day. The
/// store ignores replays of the same (user, day) pair.
pub async fn run_snapshot_sweep<R>(repository: Arc<R>, now: DateTime<Utc>) -> Result<usize>
where
    R: SnapshotRepository + ?Sized,
{
    let subscriptions = repository.list_subscriptions().await?;
    let snapshot_date = now.format("%Y-%m-%d").to_string();

    let mut written = 0;
    for subscription in subscriptions {
        let snapshot = SubscriptionDailySnapshotEntity {
            id: generate_uuid_v7(),
            user_id: subscription.user_id.clone(),
            status: subscription.status.clone(),
            next_auto_renew_at: subscription.next_auto_renew_at,
            expire_at: subscription.expire_at,
            extra: subscription.extra.clone(),
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
            snapshot_date: snapshot_date.clone(),
            snapshot_created_at: now,
        };

        match repository.save_daily_snapshot(snapshot).await {
            Ok(()) => written += 1,
            Err(err) => error!(
                user_id = %subscription.user_id,
                "Failed to save daily snapshot: {}", err
            ),
        }
    }

    Ok(written)
}

pub async fn run_snapshot_loop<R>(repository: Arc<R>, interval: Duration) -> Result<()>
where
    R: SnapshotRepository + ?Sized,
{
    loop {
        info!("Taking subscription daily snapshots...");
        match run_snapshot_sweep(Arc::clone(&repository), Utc::now()).await {
            Ok(written) => info!("Snapshot sweep finished, {} rows written", written),
            Err(err) => error!("Snapshot sweep failed: {}", err),
        }

        tokio::time::sleep(interval).await;
    }
}
