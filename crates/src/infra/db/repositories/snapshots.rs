use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::{
    domain::{
        entities::{
            daily_snapshots::SubscriptionDailySnapshotEntity, subscriptions::SubscriptionEntity,
        },
        repositories::snapshots::SnapshotRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscription, subscription_daily_snapshot},
    },
};

pub struct SnapshotPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SnapshotPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SnapshotRepository for SnapshotPostgres {
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscriptions = subscription::table.load::<SubscriptionEntity>(&mut conn)?;

        Ok(subscriptions)
    }

    async fn save_daily_snapshot(&self, snapshot: SubscriptionDailySnapshotEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::insert_into(subscription_daily_snapshot::table)
            .values(&snapshot)
            .on_conflict((
                subscription_daily_snapshot::user_id,
                subscription_daily_snapshot::snapshot_date,
            ))
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }
}
