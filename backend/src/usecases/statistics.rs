use std::collections::HashMap;
use std::sync::Arc;

use crates::domain::{
    repositories::statistics::StatisticsRepository,
    value_objects::{
        common_filters::CommonFilter,
        statistics::{
            MembershipStatisticRequest, MembershipStatisticResponse, STAT_FILTER_IS_AUTO_RENEW,
            STAT_FILTER_IS_FIRST_PURCHASE, STAT_FILTER_PAYMENT_ITEM_ID, StatisticRow,
            StatisticType,
        },
    },
};
use thiserror::Error;

use crate::axum_http::api_response::API_CODE_ERROR;

#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StatisticsError {
    pub fn api_code(&self) -> i32 {
        API_CODE_ERROR
    }
}

const RESTRICTED_FILTERS: [&str; 3] = [
    STAT_FILTER_IS_FIRST_PURCHASE,
    STAT_FILTER_IS_AUTO_RENEW,
    STAT_FILTER_PAYMENT_ITEM_ID,
];

/// The transaction-level filters only make sense for the statistics computed
/// from the transaction ledger.
fn filter_applies(field: &str, statistic: StatisticType) -> bool {
    if !RESTRICTED_FILTERS.contains(&field) {
        return true;
    }
    matches!(
        statistic,
        StatisticType::DailyTransactionCount | StatisticType::DailyGmv
    )
}

pub struct StatisticsUseCase<S>
where
    S: StatisticsRepository + 'static,
{
    statistics_repo: Arc<S>,
}

impl<S> StatisticsUseCase<S>
where
    S: StatisticsRepository + 'static,
{
    pub fn new(statistics_repo: Arc<S>) -> Self {
        Self { statistics_repo }
    }

    pub async fn get_membership_statistic(
        &self,
        request: MembershipStatisticRequest,
    ) -> Result<MembershipStatisticResponse, StatisticsError> {
        let mut data_items: HashMap<StatisticType, Vec<StatisticRow>> = HashMap::new();

        for item in &request.data_items {
            // A restricted filter that does not apply to this statistic makes
            // the whole series empty instead of silently ignoring the filter.
            let inapplicable = request.filters.iter().any(|filter| {
                RESTRICTED_FILTERS.contains(&filter.field.as_str())
                    && !filter_applies(&filter.field, item.id)
            });
            if inapplicable {
                data_items.insert(item.id, Vec::new());
                continue;
            }

            let filters: Vec<CommonFilter> = request
                .filters
                .iter()
                .filter(|filter| filter_applies(&filter.field, item.id))
                .cloned()
                .collect();

            let rows = self.fetch(item.id, &filters).await?;
            data_items.insert(item.id, rows);
        }

        Ok(MembershipStatisticResponse { data_items })
    }

    async fn fetch(
        &self,
        statistic: StatisticType,
        filters: &[CommonFilter],
    ) -> Result<Vec<StatisticRow>, StatisticsError> {
        let rows = match statistic {
            StatisticType::DailyTransactionCount => {
                self.statistics_repo.daily_transaction_count(filters).await?
            }
            StatisticType::DailyGmv => self.statistics_repo.daily_gmv(filters).await?,
            StatisticType::TotalGmv => self.statistics_repo.total_gmv().await?,
            StatisticType::DailyMembershipCount => {
                self.statistics_repo.daily_membership_count(filters).await?
            }
            StatisticType::DailyNewMembershipCount => {
                self.statistics_repo.daily_new_membership_count().await?
            }
            StatisticType::TotalMembershipCount => {
                self.statistics_repo.total_membership_count(filters).await?
            }
            StatisticType::DailyAccumulatedMembershipCount => {
                self.statistics_repo
                    .daily_accumulated_membership_count()
                    .await?
            }
            StatisticType::RenewalSuccessRate => self.statistics_repo.renewal_success_rate().await?,
        };

        Ok(rows)
    }
}
