use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use std::sync::Arc;

use crate::{
    domain::{
        repositories::statistics::StatisticsRepository,
        value_objects::{common_filters::CommonFilter, statistics::StatisticRow},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::filters::{FilterTable, append_filters},
    },
};

pub struct StatisticsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StatisticsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn run_filtered(
        &self,
        head: &str,
        filters: &[CommonFilter],
        table: FilterTable,
        tail: &str,
    ) -> Result<Vec<StatisticRow>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let query = diesel::sql_query(head.to_string()).into_boxed();
        let query = append_filters(query, filters, table)?.sql(tail.to_string());

        let rows = query.load::<StatRow>(&mut conn)?;
        Ok(rows.into_iter().map(StatRow::into_row).collect())
    }

    fn run_raw(&self, sql: &str) -> Result<Vec<StatisticRow>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = diesel::sql_query(sql.to_string()).load::<StatRow>(&mut conn)?;
        Ok(rows.into_iter().map(StatRow::into_row).collect())
    }
}

#[derive(QueryableByName)]
struct StatRow {
    #[diesel(sql_type = Text)]
    date: String,
    #[diesel(sql_type = Nullable<Text>)]
    label: Option<String>,
    #[diesel(sql_type = BigInt)]
    value: i64,
    #[diesel(sql_type = BigInt)]
    value2: i64,
    #[diesel(sql_type = BigInt)]
    value3: i64,
}

impl StatRow {
    fn into_row(self) -> StatisticRow {
        StatisticRow {
            date: self.date,
            label: self.label,
            value: self.value,
            value2: self.value2,
            value3: self.value3,
        }
    }
}

#[async_trait]
impl StatisticsRepository for StatisticsPostgres {
    async fn daily_transaction_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>> {
        self.run_filtered(
            "SELECT TO_CHAR(created_at, 'YYYY-MM-DD') AS date, NULL::TEXT AS label, \
             COUNT(*)::BIGINT AS value, 0::BIGINT AS value2, 0::BIGINT AS value3 \
             FROM \"transaction\" WHERE provider_id != 'inner'",
            filters,
            FilterTable::Transaction,
            " GROUP BY TO_CHAR(created_at, 'YYYY-MM-DD') ORDER BY date",
        )
    }

    async fn daily_gmv(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>> {
        self.run_filtered(
            "SELECT TO_CHAR(created_at, 'YYYY-MM-DD') AS date, currency AS label, \
             COALESCE(SUM(price), 0)::BIGINT AS value, 0::BIGINT AS value2, 0::BIGINT AS value3 \
             FROM \"transaction\" WHERE provider_id != 'inner'",
            filters,
            FilterTable::Transaction,
            " GROUP BY TO_CHAR(created_at, 'YYYY-MM-DD'), currency ORDER BY date DESC",
        )
    }

    async fn total_gmv(&self) -> Result<Vec<StatisticRow>> {
        self.run_raw(
            r#"
WITH min_max_dates AS (
    SELECT MIN(DATE(created_at)) AS min_date, MAX(DATE(created_at)) AS max_date
    FROM "transaction"
),
distinct_dates AS (
    SELECT generate_series(min_date, max_date, '1 day'::interval) AS date FROM min_max_dates
),
dates AS (
    SELECT TO_CHAR(date, 'YYYY-MM-DD') AS date FROM distinct_dates
),
currencies AS (
    SELECT DISTINCT currency AS label FROM "transaction" WHERE provider_id != 'inner'
),
date_currency_combinations AS (
    SELECT d.date, c.label FROM dates d CROSS JOIN currencies c
),
gmv_date AS (
    SELECT dc.date, dc.label, COALESCE(SUM(t.price), 0) AS value
    FROM date_currency_combinations dc
    LEFT JOIN "transaction" t
      ON TO_CHAR(t.created_at, 'YYYY-MM-DD') = dc.date
     AND t.currency = dc.label
     AND t.provider_id != 'inner'
    GROUP BY dc.date, dc.label
)
SELECT d.date AS date, d.label AS label, SUM(s.value)::BIGINT AS value,
       0::BIGINT AS value2, 0::BIGINT AS value3
FROM gmv_date d
LEFT JOIN gmv_date s ON s.date <= d.date AND s.label = d.label
GROUP BY d.date, d.label
ORDER BY d.date DESC, d.label ASC
"#,
        )
    }

    async fn daily_membership_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>> {
        self.run_filtered(
            "SELECT snapshot_date AS date, NULL::TEXT AS label, COUNT(*)::BIGINT AS value, \
             0::BIGINT AS value2, 0::BIGINT AS value3 \
             FROM subscription_daily_snapshot WHERE 1=1",
            filters,
            FilterTable::DailySnapshot,
            " GROUP BY snapshot_date ORDER BY snapshot_date",
        )
    }

    async fn daily_new_membership_count(&self) -> Result<Vec<StatisticRow>> {
        self.run_raw(
            r#"
WITH distinct_dates AS (
    SELECT DISTINCT DATE(created_at) AS date FROM subscription ORDER BY date
),
user_id_date AS (
    SELECT user_id, DATE(created_at) AS date FROM subscription
)
SELECT TO_CHAR(d.date, 'YYYY-MM-DD') AS date, NULL::TEXT AS label,
       COUNT(DISTINCT s.user_id)::BIGINT AS value, 0::BIGINT AS value2, 0::BIGINT AS value3
FROM distinct_dates d
JOIN user_id_date s ON s.date = d.date
GROUP BY d.date
ORDER BY d.date DESC
"#,
        )
    }

    async fn total_membership_count(&self, filters: &[CommonFilter]) -> Result<Vec<StatisticRow>> {
        self.run_filtered(
            "SELECT ''::TEXT AS date, NULL::TEXT AS label, COUNT(*)::BIGINT AS value, \
             0::BIGINT AS value2, 0::BIGINT AS value3 \
             FROM subscription WHERE status = 'active' AND expire_at >= NOW()",
            filters,
            FilterTable::Subscription,
            "",
        )
    }

    async fn daily_accumulated_membership_count(&self) -> Result<Vec<StatisticRow>> {
        self.run_raw(
            r#"
WITH min_max_dates AS (
    SELECT MIN(DATE(created_at)) AS min_date, MAX(DATE(created_at)) AS max_date FROM subscription
),
distinct_dates AS (
    SELECT generate_series(min_date, max_date, '1 day'::interval) AS date FROM min_max_dates
),
user_id_date AS (
    SELECT user_id, DATE(created_at) AS date FROM subscription
)
SELECT TO_CHAR(d.date, 'YYYY-MM-DD') AS date, NULL::TEXT AS label,
       COUNT(DISTINCT s.user_id)::BIGINT AS value, 0::BIGINT AS value2, 0::BIGINT AS value3
FROM distinct_dates d
LEFT JOIN user_id_date s ON s.date <= d.date
GROUP BY d.date
ORDER BY d.date DESC
"#,
        )
    }

    async fn renewal_success_rate(&self) -> Result<Vec<StatisticRow>> {
        self.run_raw(
            r#"
WITH renewal_count AS (
  SELECT user_id, DATE(purchase_at) AS purchase_date, DATE(next_auto_renew_at) AS next_auto_renew_date
  FROM "transaction"
  WHERE provider_id != 'inner'
    AND parent_transaction_id IS NOT NULL
  GROUP BY user_id, DATE(purchase_at), DATE(next_auto_renew_at)
),
successful_renewals AS (
  SELECT r1.next_auto_renew_date, COUNT(*) AS count1
  FROM renewal_count r1
  JOIN renewal_count r2 ON r1.user_id = r2.user_id AND r1.next_auto_renew_date = r2.purchase_date
  GROUP BY r1.next_auto_renew_date
),
total_renewals AS (
  SELECT next_auto_renew_date, COUNT(*) AS count2
  FROM renewal_count
  WHERE next_auto_renew_date IS NOT NULL
    AND next_auto_renew_date < DATE(NOW() + INTERVAL '1 day')
  GROUP BY next_auto_renew_date
)
SELECT
  TO_CHAR(COALESCE(s.next_auto_renew_date, t.next_auto_renew_date), 'YYYY-MM-DD') AS date,
  NULL::TEXT AS label,
  CASE WHEN t.count2 = 0 THEN 0
       ELSE CAST(ROUND(LEAST(COALESCE(s.count1, 0) * 100.0 / t.count2, 100), 2) * 100 AS BIGINT)
  END AS value,
  t.count2::BIGINT AS value2,
  COALESCE(s.count1, 0)::BIGINT AS value3
FROM total_renewals t
LEFT JOIN successful_renewals s ON t.next_auto_renew_date = s.next_auto_renew_date
ORDER BY date DESC
"#,
        )
    }
}
