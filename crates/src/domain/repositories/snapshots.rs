use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::daily_snapshots::SubscriptionDailySnapshotEntity;
use crate::domain::entities::subscriptions::SubscriptionEntity;

#[mockall::automock]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>>;

    /// Persists one snapshot per user per day; replays of the same day are
    /// ignored.
    async fn save_daily_snapshot(&self, snapshot: SubscriptionDailySnapshotEntity) -> Result<()>;
}
