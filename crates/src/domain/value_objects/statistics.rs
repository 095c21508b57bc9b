use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::common_filters::CommonFilter;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatisticType {
    DailyTransactionCount,
    DailyGmv,
    TotalGmv,
    DailyMembershipCount,
    DailyNewMembershipCount,
    TotalMembershipCount,
    DailyAccumulatedMembershipCount,
    RenewalSuccessRate,
}

/// Filter fields with restricted applicability across statistic types.
pub const STAT_FILTER_IS_FIRST_PURCHASE: &str = "is_first_purchase";
pub const STAT_FILTER_IS_AUTO_RENEW: &str = "is_auto_renew";
pub const STAT_FILTER_PAYMENT_ITEM_ID: &str = "payment_item_id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticDataItem {
    pub id: StatisticType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipStatisticRequest {
    #[serde(default)]
    pub filters: Vec<CommonFilter>,
    #[serde(default)]
    pub data_items: Vec<StatisticDataItem>,
}

/// One datapoint of a statistic series.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatisticRow {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub value2: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub value3: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MembershipStatisticResponse {
    pub data_items: HashMap<StatisticType, Vec<StatisticRow>>,
}
