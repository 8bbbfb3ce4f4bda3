//! SQL implementation of the price history store
//!
//! One table per variant, named after the validated [`VariantId`]. Rows are
//! only ever inserted; the read-back path exists for the `history` command.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{PersistenceError, PriceHistoryStore, PriceObservation, VariantId};
use crate::infrastructure::database_connection::{DatabaseConnection, DatabasePool, Dialect};

pub struct SqlPriceHistoryRepository {
    pool: DatabasePool,
}

impl SqlPriceHistoryRepository {
    pub fn new(connection: &DatabaseConnection) -> Self {
        Self {
            pool: connection.pool().clone(),
        }
    }

    const fn dialect(&self) -> Dialect {
        self.pool.dialect()
    }
}

// Table names come from VariantId ([a-z][a-z0-9_]*) and are always quoted:
// ids like `order` or `user` are reserved words.
fn create_table_sql(dialect: Dialect, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                time TIMESTAMP NOT NULL,
                price REAL NOT NULL
            )"#
        ),
        Dialect::Postgres => format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id SERIAL,
                time timestamp NOT NULL,
                price float NOT NULL,
                PRIMARY KEY(id)
            )"#
        ),
    }
}

fn create_index_sql(table: &str, index: &str) -> String {
    format!(r#"CREATE INDEX IF NOT EXISTS "{index}" ON "{table}"(time)"#)
}

fn insert_sql(dialect: Dialect, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!(r#"INSERT INTO "{table}"(time, price) VALUES (?, ?)"#),
        Dialect::Postgres => format!(r#"INSERT INTO "{table}"(time, price) VALUES ($1, $2)"#),
    }
}

fn recent_sql(dialect: Dialect, table: &str) -> String {
    let limit = match dialect {
        Dialect::Sqlite => "?",
        Dialect::Postgres => "$1",
    };
    format!(r#"SELECT time, price FROM "{table}" ORDER BY time DESC, id DESC LIMIT {limit}"#)
}

fn schema_error(table: &str) -> impl FnOnce(sqlx::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Schema {
        table: table.to_string(),
        source,
    }
}

#[async_trait]
impl PriceHistoryStore for SqlPriceHistoryRepository {
    async fn ensure_schema(&self, variant_id: &VariantId) -> Result<(), PersistenceError> {
        let table = variant_id.as_str();
        let create_table = create_table_sql(self.dialect(), table);
        let create_index = create_index_sql(table, &variant_id.time_index_name());

        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(&create_table).execute(pool).await.map_err(schema_error(table))?;
                sqlx::query(&create_index).execute(pool).await.map_err(schema_error(table))?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(&create_table).execute(pool).await.map_err(schema_error(table))?;
                sqlx::query(&create_index).execute(pool).await.map_err(schema_error(table))?;
            }
        }

        debug!(table, "Price history schema ready");
        Ok(())
    }

    async fn append(&self, observation: &PriceObservation) -> Result<(), PersistenceError> {
        let table = observation.variant_id.as_str();
        let sql = insert_sql(self.dialect(), table);
        let observed_at = observation.observed_at.naive_utc();

        let result = match &self.pool {
            DatabasePool::Sqlite(pool) => sqlx::query(&sql)
                .bind(observed_at)
                .bind(observation.price)
                .execute(pool)
                .await
                .map(|done| done.rows_affected()),
            DatabasePool::Postgres(pool) => sqlx::query(&sql)
                .bind(observed_at)
                .bind(observation.price)
                .execute(pool)
                .await
                .map(|done| done.rows_affected()),
        };

        let rows = result.map_err(|source| PersistenceError::Insert {
            table: table.to_string(),
            source,
        })?;
        debug!(table, rows, price = observation.price, "Observation appended");
        Ok(())
    }

    async fn recent(&self, variant_id: &VariantId, limit: u32) -> Result<Vec<PriceObservation>, PersistenceError> {
        let table = variant_id.as_str();
        let sql = recent_sql(self.dialect(), table);
        let query_error = |source: sqlx::Error| PersistenceError::Query {
            table: table.to_string(),
            source,
        };

        let rows: Vec<(NaiveDateTime, f64)> = match &self.pool {
            DatabasePool::Sqlite(pool) => sqlx::query_as(&sql)
                .bind(i64::from(limit))
                .fetch_all(pool)
                .await
                .map_err(query_error)?,
            DatabasePool::Postgres(pool) => sqlx::query_as(&sql)
                .bind(i64::from(limit))
                .fetch_all(pool)
                .await
                .map_err(query_error)?,
        };

        // Newest first from the query; callers want chronological order
        Ok(rows
            .into_iter()
            .rev()
            .map(|(time, price)| PriceObservation::new(variant_id.clone(), time.and_utc(), price))
            .collect())
    }
}
