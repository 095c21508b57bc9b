use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::{
    domain::{
        entities::notification_logs::PaymentNotificationLogEntity,
        repositories::notification_logs::NotificationLogRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_notification_log},
};

pub struct NotificationLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationLogRepository for NotificationLogPostgres {
    async fn save(&self, log: PaymentNotificationLogEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::insert_into(payment_notification_log::table)
            .values(&log)
            .execute(&mut conn)?;

        Ok(())
    }
}
