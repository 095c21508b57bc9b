use anyhow::Result;
use async_trait::async_trait;

use crate::domain::value_objects::common_filters::CommonFilter;
use crate::domain::value_objects::statistics::StatisticRow;

#[mockall::automock]
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    async fn daily_transaction_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>>;

    async fn daily_gmv(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>>;

    async fn total_gmv(&self) -> Result<Vec<StatisticRow>>;

    async fn daily_membership_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>>;

    async fn daily_new_membership_count(&self) -> Result<Vec<StatisticRow>>;

    async fn total_membership_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>>;

    async fn daily_accumulated_membership_count(&self) -> Result<Vec<StatisticRow>>;

    async fn renewal_success_rate(&self) -> Result<Vec<StatisticRow>>;
}
