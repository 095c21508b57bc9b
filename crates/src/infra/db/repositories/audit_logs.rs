use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::{
    domain::{
        entities::audit_logs::{SubscriptionLogEntity, TransactionLogEntity},
        repositories::audit_logs::AuditLogRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscription_log, transaction_log},
    },
};

pub struct AuditLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AuditLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AuditLogRepository for AuditLogPostgres {
    async fn save_transaction_log(&self, log: TransactionLogEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::insert_into(transaction_log::table)
            .values(&log)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn save_subscription_log(&self, log: SubscriptionLogEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::insert_into(subscription_log::table)
            .values(&log)
            .execute(&mut conn)?;

        Ok(())
    }
}
