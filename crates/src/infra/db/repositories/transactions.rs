use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::sync::Arc;

use crate::{
    domain,
    infra::db::{
        postgres::{postgres_connection::PgPoolSquad, schema::transaction},
        repositories::filters::{FilterTable, append_filters, sort_column},
    },
};
use domain::{
    entities::transactions::TransactionEntity,
    repositories::transactions::TransactionRepository,
    value_objects::{
        enums::{payment_providers::PaymentProvider, sort_order::SortOrder},
        transactions::{ScanTransactionsRequest, ScanTransactionsResponse},
    },
};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn find_by_provider_transaction_id(
        &self,
        provider_id: PaymentProvider,
        transaction_id: &str,
    ) -> Result<Option<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let found = transaction::table
            .filter(transaction::provider_id.eq(provider_id.to_string()))
            .filter(transaction::transaction_id.eq(transaction_id))
            .first::<TransactionEntity>(&mut conn)
            .optional()?;

        Ok(found)
    }

    async fn exists_same_purchase_transaction(
        &self,
        transaction_id: &str,
        provider_id: PaymentProvider,
        parent_transaction_id: &str,
        purchase_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count: i64 = transaction::table
            .filter(transaction::transaction_id.ne(transaction_id))
            .filter(transaction::provider_id.eq(provider_id.to_string()))
            .filter(transaction::parent_transaction_id.eq(parent_transaction_id))
            .filter(transaction::purchase_at.eq(purchase_at))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    async fn list_user_transactions(&self, user_id: &str) -> Result<Vec<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let items = transaction::table
            .filter(transaction::user_id.eq(user_id))
            .order(transaction::purchase_at.desc())
            .load::<TransactionEntity>(&mut conn)?;

        Ok(items)
    }

    async fn scan_transactions(
        &self,
        request: &ScanTransactionsRequest,
    ) -> Result<ScanTransactionsResponse> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let request = request.clone().normalized();

        let count_query = diesel::sql_query(
            "SELECT COUNT(*) AS total FROM \"transaction\" WHERE 1=1".to_string(),
        )
        .into_boxed();
        let count_query = append_filters(count_query, &request.filters, FilterTable::Transaction)?;
        let total = count_query
            .get_result::<CountRow>(&mut conn)
            .map(|row| row.total)?;

        let mut query = diesel::sql_query(
            "SELECT \"transaction\".* FROM \"transaction\" WHERE 1=1".to_string(),
        )
        .into_boxed();
        query = append_filters(query, &request.filters, FilterTable::Transaction)?;

        if !request.sort_by.is_empty() {
            let column = sort_column(FilterTable::Transaction, &request.sort_by)?;
            let direction = match request.sort_order() {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            query = query.sql(format!(" ORDER BY {column} {direction}"));
        }

        query = query.sql(" LIMIT ").bind::<BigInt, _>(request.size);
        if request.from > 0 {
            query = query.sql(" OFFSET ").bind::<BigInt, _>(request.from);
        }

        let items = query.load::<TransactionEntity>(&mut conn)?;

        Ok(ScanTransactionsResponse { items, total })
    }
}
