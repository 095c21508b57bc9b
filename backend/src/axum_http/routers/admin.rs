use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::transactions::TransactionEntity,
        repositories::transactions::TransactionRepository,
        value_objects::{
            enums::payment_item_types::PaymentItemType,
            payment_items::PaymentItemCatalog,
            statistics::MembershipStatisticRequest,
            transactions::ScanTransactionsRequest,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{statistics::StatisticsPostgres, transactions::TransactionPostgres},
    },
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, API_CODE_ERROR, error, ok};
use crate::axum_http::routers::payment_v2::{Entitlements, build_entitlements};
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::statistics::StatisticsUseCase;

pub struct AdminState {
    transactions: Arc<TransactionPostgres>,
    statistics: Arc<StatisticsUseCase<StatisticsPostgres>>,
    entitlements: Arc<Entitlements>,
    catalog: PaymentItemCatalog,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let state = AdminState {
        transactions: Arc::new(TransactionPostgres::new(Arc::clone(&db_pool))),
        statistics: Arc::new(StatisticsUseCase::new(Arc::new(StatisticsPostgres::new(
            Arc::clone(&db_pool),
        )))),
        entitlements: build_entitlements(&db_pool, &config),
        catalog: config.catalog(),
    };

    Router::new()
        .route("/list_user_membership_item", post(list_user_membership_item))
        .route("/get_membership_statistic", post(get_membership_statistic))
        .route("/send_free_gift", post(send_free_gift))
        .with_state(Arc::new(state))
}

/// Admin projection of a ledger row, with the payment item resolved from the
/// snapshot (catalog fallback).
#[derive(Debug, Serialize)]
pub struct TransactionListItem {
    pub id: Uuid,
    pub transaction_id: String,
    pub user_id: String,
    pub currency: String,
    pub price: i64,
    pub provider_id: String,
    pub is_first_purchase: bool,
    pub purchase_at: DateTime<Utc>,
    pub refund_at: Option<DateTime<Utc>>,
    pub next_auto_renew_at: Option<DateTime<Utc>>,
    pub auto_renew_expire_at: Option<DateTime<Utc>>,
    pub parent_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_item_id: String,
    pub payment_item_type: Option<PaymentItemType>,
    pub provider_item_id: String,
    pub membership_duration_minutes: i64,
}

pub fn to_transaction_list_item(
    catalog: &PaymentItemCatalog,
    entity: &TransactionEntity,
) -> TransactionListItem {
    let payment_item = entity
        .payment_item_snapshot()
        .or_else(|| catalog.get_by_id(&entity.payment_item_id).cloned());

    let (payment_item_type, provider_item_id, membership_duration_minutes) = match &payment_item {
        Some(item) => (
            Some(item.item_type),
            item.provider_item_id.clone(),
            item.duration_hours.map(|hours| hours * 60).unwrap_or(0),
        ),
        None => (None, String::new(), 0),
    };

    TransactionListItem {
        id: entity.id,
        transaction_id: entity.transaction_id.clone(),
        user_id: entity.user_id.clone(),
        currency: entity.currency.clone(),
        price: entity.price,
        provider_id: entity.provider_id.clone(),
        is_first_purchase: entity.extra().is_first_purchase,
        purchase_at: entity.purchase_at,
        refund_at: entity.refund_at,
        next_auto_renew_at: entity.next_auto_renew_at,
        auto_renew_expire_at: entity.auto_renew_expire_at,
        parent_transaction_id: entity.parent_transaction_id.clone(),
        created_at: entity.created_at,
        updated_at: entity.updated_at,
        payment_item_id: entity.payment_item_id.clone(),
        payment_item_type,
        provider_item_id,
        membership_duration_minutes,
    }
}

#[derive(Debug, Serialize)]
struct ListTransactionsResponse {
    items: Vec<TransactionListItem>,
    total: i64,
}

async fn list_user_membership_item(
    State(state): State<Arc<AdminState>>,
    payload: Result<Json<ScanTransactionsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error(API_CODE_BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    match state.transactions.scan_transactions(&request).await {
        Ok(result) => {
            let items = result
                .items
                .iter()
                .map(|entity| to_transaction_list_item(&state.catalog, entity))
                .collect();
            ok(ListTransactionsResponse {
                items,
                total: result.total,
            })
            .into_response()
        }
        Err(err) => {
            error!("list_user_membership_item failed: {err}");
            error(API_CODE_ERROR, err.to_string()).into_response()
        }
    }
}

async fn get_membership_statistic(
    State(state): State<Arc<AdminState>>,
    payload: Result<Json<MembershipStatisticRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error(API_CODE_BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    match state.statistics.get_membership_statistic(request).await {
        Ok(response) => ok(response).into_response(),
        Err(err) => {
            error!("get_membership_statistic failed: {err}");
            error(err.api_code(), err.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendFreeGiftRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    payment_item_id: String,
    #[serde(default)]
    operator_id: String,
}

async fn send_free_gift(
    State(state): State<Arc<AdminState>>,
    payload: Result<Json<SendFreeGiftRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error(API_CODE_BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    if request.user_id.is_empty()
        || request.payment_item_id.is_empty()
        || request.operator_id.is_empty()
    {
        return error(
            API_CODE_BAD_REQUEST,
            "missing user_id or payment_item_id or operator_id",
        )
        .into_response();
    }

    match state
        .entitlements
        .send_free_gift(&request.user_id, &request.payment_item_id, &request.operator_id)
        .await
    {
        Ok(()) => ok(serde_json::Value::Null).into_response(),
        Err(err) => {
            error!("send_free_gift failed: {err}");
            error(err.api_code(), err.to_string()).into_response()
        }
    }
}
