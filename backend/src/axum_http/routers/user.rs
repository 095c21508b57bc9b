use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use crates::{
    domain::{
        repositories::transactions::TransactionRepository,
        value_objects::{
            common_filters::{CommonFilter, CommonFilterOperator},
            transactions::ScanTransactionsRequest,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::transactions::TransactionPostgres,
    },
};
use serde::Deserialize;
use tracing::error;

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, API_CODE_ERROR, error, ok};

pub struct UserState {
    transactions: Arc<TransactionPostgres>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let state = UserState {
        transactions: Arc::new(TransactionPostgres::new(db_pool)),
    };

    Router::new()
        .route("/transaction/list", get(transaction_list))
        .with_state(Arc::new(state))
}

#[derive(Debug, Default, Deserialize)]
struct TransactionListQuery {
    #[serde(default)]
    user_id: String,
    from: Option<String>,
    size: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

async fn transaction_list(
    State(state): State<Arc<UserState>>,
    Query(query): Query<TransactionListQuery>,
) -> Response {
    if query.user_id.is_empty() {
        return error(API_CODE_BAD_REQUEST, "missing user_id").into_response();
    }

    let from = query
        .from
        .as_deref()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value >= 0)
        .unwrap_or(0);

    let size = match query.size.as_deref() {
        None | Some("") => 100,
        Some(value) => match value.parse::<i64>() {
            Ok(size) if size > 0 => size,
            _ => return error(API_CODE_BAD_REQUEST, "invalid size").into_response(),
        },
    };

    let sort_by = match query.sort_by.as_deref() {
        None | Some("") => "purchase_at".to_string(),
        Some(value) => value.to_string(),
    };
    let sort_order = match query.sort_order.as_deref() {
        Some("asc") => "asc".to_string(),
        _ => "desc".to_string(),
    };

    let request = ScanTransactionsRequest {
        filters: vec![CommonFilter {
            field: "user_id".to_string(),
            operator: CommonFilterOperator::Eq,
            values: vec![serde_json::json!(query.user_id)],
        }],
        from,
        size,
        sort_by,
        sort_order,
    };

    match state.transactions.scan_transactions(&request).await {
        Ok(result) => ok(result.items).into_response(),
        Err(err) => {
            error!("user transaction list failed: {err}");
            error(API_CODE_ERROR, err.to_string()).into_response()
        }
    }
}
