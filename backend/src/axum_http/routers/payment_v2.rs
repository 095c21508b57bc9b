use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            audit_logs::AuditLogPostgres, entitlements::EntitlementPostgres,
            notification_logs::NotificationLogPostgres, transactions::TransactionPostgres,
        },
    },
    payments::apple::client::AppleStoreClient,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::axum_http::api_response::{API_CODE_BAD_REQUEST, error, ok};
use crate::axum_http::middleware::TraceId;
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::{
    entitlements::EntitlementUseCase, notifications::NotificationIngestUseCase,
    verify::VerifyUseCase,
};

pub type Entitlements =
    EntitlementUseCase<EntitlementPostgres, AuditLogPostgres, TransactionPostgres>;
type Verify = VerifyUseCase<
    AppleStoreClient,
    TransactionPostgres,
    NotificationLogPostgres,
    EntitlementPostgres,
    AuditLogPostgres,
>;
type Ingest = NotificationIngestUseCase<
    EntitlementPostgres,
    AuditLogPostgres,
    TransactionPostgres,
    NotificationLogPostgres,
>;

pub struct PaymentV2State {
    verify: Arc<Verify>,
    ingest: Arc<Ingest>,
}

pub fn build_entitlements(
    db_pool: &Arc<PgPoolSquad>,
    config: &DotEnvyConfig,
) -> Arc<Entitlements> {
    let catalog = config.catalog();
    Arc::new(EntitlementUseCase::new(
        Arc::new(EntitlementPostgres::new(Arc::clone(db_pool), catalog.clone())),
        Arc::new(AuditLogPostgres::new(Arc::clone(db_pool))),
        Arc::new(TransactionPostgres::new(Arc::clone(db_pool))),
        catalog,
    ))
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let catalog = config.catalog();
    let entitlements = build_entitlements(&db_pool, &config);
    let notification_logs = Arc::new(NotificationLogPostgres::new(Arc::clone(&db_pool)));

    let gateway = Arc::new(AppleStoreClient::new(config.apple_iap.client_options()));
    let verify = Arc::new(VerifyUseCase::new(
        gateway,
        Arc::new(TransactionPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&notification_logs),
        Arc::clone(&entitlements),
        catalog.clone(),
        config.apple_iap.is_prod,
    ));
    let ingest = Arc::new(NotificationIngestUseCase::new(
        catalog,
        entitlements,
        notification_logs,
    ));

    Router::new()
        .route("/verify_transaction", post(verify_transaction))
        .route("/webhook/apple", post(apple_webhook))
        .with_state(Arc::new(PaymentV2State { verify, ingest }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyTransactionRequest {
    pub provider_id: String,
    pub transaction_id: String,
    #[serde(default)]
    pub server_verification_data: String,
}

#[derive(Debug, Serialize)]
struct DownGradeAutoRenewInfo {
    vip_id: String,
    next_auto_renew_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct VerifyTransactionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    down_grade_auto_renew_info: Option<DownGradeAutoRenewInfo>,
}

async fn verify_transaction(
    State(state): State<Arc<PaymentV2State>>,
    Extension(TraceId(trace_id)): Extension<TraceId>,
    payload: Result<Json<VerifyTransactionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error(API_CODE_BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    match state
        .verify
        .verify_transaction(
            &req.provider_id,
            &req.transaction_id,
            &req.server_verification_data,
            &trace_id,
        )
        .await
    {
        Ok(result) => {
            let down_grade_auto_renew_info = if result.is_downgrade() {
                result
                    .downgrade_next_auto_renew_at
                    .map(|next_auto_renew_at| DownGradeAutoRenewInfo {
                        vip_id: result.downgrade_to_vip_id.clone(),
                        next_auto_renew_at,
                    })
            } else {
                None
            };
            ok(VerifyTransactionResponse {
                down_grade_auto_renew_info,
            })
            .into_response()
        }
        Err(err) => {
            error!(trace_id = %trace_id, "verify_transaction failed: {err}");
            error(err.api_code(), err.to_string()).into_response()
        }
    }
}

async fn apple_webhook(
    State(state): State<Arc<PaymentV2State>>,
    Extension(TraceId(trace_id)): Extension<TraceId>,
    body: String,
) -> Response {
    info!(trace_id = %trace_id, "webhook_apple_received");

    match state
        .ingest
        .handle_notification("apple", &body, &trace_id)
        .await
    {
        Ok(()) => {
            info!(trace_id = %trace_id, "webhook_apple_handled");
            ok(serde_json::Value::Null).into_response()
        }
        Err(err) => {
            error!(trace_id = %trace_id, "webhook_apple_handle_error: {err}");
            error(err.api_code(), err.to_string()).into_response()
        }
    }
}
