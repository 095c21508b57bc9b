use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::notification_logs::PaymentNotificationLogEntity;

#[mockall::automock]
#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    async fn save(&self, log: PaymentNotificationLogEntity) -> Result<()>;
}
