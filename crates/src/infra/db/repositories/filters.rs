use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Text, Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use crate::domain::value_objects::common_filters::{CommonFilter, CommonFilterOperator};

pub type BoxedRawQuery = BoxedSqlQuery<'static, Pg, SqlQuery>;

/// Which table a filter set is applied against; decides the column
/// whitelist. Field names never reach the SQL text directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTable {
    Transaction,
    Subscription,
    DailySnapshot,
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Uuid,
    Text,
    BigInt,
    Timestamp,
}

fn column_kind(table: FilterTable, field: &str) -> Option<ColumnKind> {
    match table {
        FilterTable::Transaction => match field {
            "id" => Some(ColumnKind::Uuid),
            "user_id" | "provider_id" | "payment_item_id" | "transaction_id"
            | "parent_transaction_id" | "before_upgraded_transaction_id" | "currency"
            | "revocation_reason" => Some(ColumnKind::Text),
            "price" => Some(ColumnKind::BigInt),
            "purchase_at" | "refund_at" | "expire_at" | "next_auto_renew_at"
            | "revocation_date" | "created_at" | "updated_at" => Some(ColumnKind::Timestamp),
            _ => None,
        },
        FilterTable::Subscription => match field {
            "id" => Some(ColumnKind::Uuid),
            "user_id" | "status" => Some(ColumnKind::Text),
            "expire_at" | "next_auto_renew_at" | "created_at" | "updated_at" => {
                Some(ColumnKind::Timestamp)
            }
            _ => None,
        },
        FilterTable::DailySnapshot => match field {
            "id" => Some(ColumnKind::Uuid),
            "user_id" | "status" | "snapshot_date" => Some(ColumnKind::Text),
            "expire_at" | "next_auto_renew_at" | "created_at" | "updated_at"
            | "snapshot_created_at" => Some(ColumnKind::Timestamp),
            _ => None,
        },
    }
}

fn truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(flag)) => *flag,
        Some(serde_json::Value::String(text)) => text == "true",
        _ => false,
    }
}

fn bind_value(
    query: BoxedRawQuery,
    kind: ColumnKind,
    value: &serde_json::Value,
) -> Result<BoxedRawQuery> {
    match kind {
        ColumnKind::Uuid => {
            let text = value
                .as_str()
                .ok_or_else(|| anyhow!("uuid filter value must be a string"))?;
            let id = Uuid::parse_str(text)?;
            Ok(query.bind::<SqlUuid, _>(id))
        }
        ColumnKind::Text => {
            let text = value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            Ok(query.bind::<Text, _>(text))
        }
        ColumnKind::BigInt => {
            let number = match value {
                serde_json::Value::Number(number) => number.as_i64(),
                serde_json::Value::String(text) => text.parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| anyhow!("numeric filter value expected"))?;
            Ok(query.bind::<BigInt, _>(number))
        }
        ColumnKind::Timestamp => {
            let at = parse_timestamp(value)?;
            Ok(query.bind::<Timestamptz, _>(at))
        }
    }
}

fn parse_timestamp(value: &serde_json::Value) -> Result<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|err| anyhow!("invalid timestamp filter value {text:?}: {err}")),
        serde_json::Value::Number(number) => number
            .as_i64()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .ok_or_else(|| anyhow!("invalid unix timestamp filter value")),
        _ => bail!("timestamp filter value must be a string or number"),
    }
}

fn parse_date(value: &serde_json::Value) -> Result<NaiveDate> {
    let text = value
        .as_str()
        .ok_or_else(|| anyhow!("date filter value must be a string"))?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|err| anyhow!("invalid date filter value {text:?}: {err}"))
}

/// Appends one `AND (...)` fragment per filter. Synthetic reporting fields
/// expand to fixed SQL; everything else goes through the column whitelist
/// with bound parameters.
pub fn append_filters(
    mut query: BoxedRawQuery,
    filters: &[CommonFilter],
    table: FilterTable,
) -> Result<BoxedRawQuery> {
    for filter in filters {
        if table == FilterTable::Transaction {
            match filter.field.as_str() {
                "is_first_purchase" => {
                    query = if truthy(filter.first_value()) {
                        query.sql(" AND (extra->>'is_first_purchase' = 'true')")
                    } else {
                        query.sql(
                            " AND (extra->>'is_first_purchase' = 'false' OR extra->>'is_first_purchase' IS NULL)",
                        )
                    };
                    continue;
                }
                "is_auto_renew" => {
                    query = if truthy(filter.first_value()) {
                        query.sql(
                            " AND (parent_transaction_id IS NOT NULL AND parent_transaction_id != transaction_id)",
                        )
                    } else {
                        query.sql(
                            " AND (parent_transaction_id IS NULL OR parent_transaction_id = transaction_id)",
                        )
                    };
                    continue;
                }
                _ => {}
            }
        }

        if filter.values.is_empty() {
            continue;
        }

        let kind = column_kind(table, &filter.field)
            .ok_or_else(|| anyhow!("unsupported filter field: {}", filter.field))?;
        let column = filter.field.as_str();

        match filter.operator {
            CommonFilterOperator::Eq => {
                query = query.sql(format!(" AND {column} = "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::NotEq => {
                query = query.sql(format!(" AND {column} != "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::Lt => {
                query = query.sql(format!(" AND {column} < "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::Lte => {
                query = query.sql(format!(" AND {column} <= "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::Gt => {
                query = query.sql(format!(" AND {column} > "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::Gte => {
                query = query.sql(format!(" AND {column} >= "));
                query = bind_value(query, kind, &filter.values[0])?;
            }
            CommonFilterOperator::Range => {
                if filter.values.len() < 2 {
                    continue;
                }
                query = query.sql(format!(" AND {column} >= "));
                query = bind_value(query, kind, &filter.values[0])?;
                query = query.sql(format!(" AND {column} <= "));
                query = bind_value(query, kind, &filter.values[1])?;
            }
            CommonFilterOperator::In => {
                query = query.sql(format!(" AND {column} IN ("));
                for (index, value) in filter.values.iter().enumerate() {
                    if index > 0 {
                        query = query.sql(", ");
                    }
                    query = bind_value(query, kind, value)?;
                }
                query = query.sql(")");
            }
            CommonFilterOperator::DateRange => {
                if filter.values.len() < 2 {
                    continue;
                }
                let start = parse_date(&filter.values[0])?;
                let end = parse_date(&filter.values[1])?;
                let start_at = start.and_time(NaiveTime::MIN).and_utc();
                let end_at = (end + chrono::Duration::days(1))
                    .and_time(NaiveTime::MIN)
                    .and_utc();
                query = query.sql(format!(" AND {column} >= "));
                query = query.bind::<Timestamptz, _>(start_at);
                query = query.sql(format!(" AND {column} < "));
                query = query.bind::<Timestamptz, _>(end_at);
            }
        }
    }

    Ok(query)
}

/// Validates a sort column against the whitelist before it is interpolated
/// into an ORDER BY clause.
pub fn sort_column(table: FilterTable, field: &str) -> Result<&'static str> {
    let known = match table {
        FilterTable::Transaction => [
            "id",
            "user_id",
            "provider_id",
            "payment_item_id",
            "transaction_id",
            "currency",
            "price",
            "purchase_at",
            "refund_at",
            "expire_at",
            "next_auto_renew_at",
            "created_at",
            "updated_at",
        ]
        .iter()
        .find(|column| **column == field),
        FilterTable::Subscription | FilterTable::DailySnapshot => ["user_id", "created_at"]
            .iter()
            .find(|column| **column == field),
    };

    known
        .copied()
        .ok_or_else(|| anyhow!("unsupported sort field: {field}"))
}
