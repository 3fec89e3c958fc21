//! Postgres document store.

use super::{DocumentStore, PageCursor, StoreTransaction};
use crate::config::DatabaseConfig;
use crate::error::{store_error, WorkshopError};
use crate::models::{BusinessSettings, Payment, Quote, WorkOrder};
use crate::services::metrics::STORE_OPERATION_DURATION;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Document store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new connection pool.
    #[instrument(skip(database_url, settings), fields(service = "workshop-service"))]
    pub async fn connect(
        database_url: &str,
        settings: &DatabaseConfig,
    ) -> Result<Self, WorkshopError> {
        info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| store_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), WorkshopError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| WorkshopError::Store(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, WorkshopError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("Failed to set isolation level", e))?;

        Ok(PgTransaction { tx })
    }

    #[instrument(skip(self), fields(quote_id = %id))]
    async fn quote(&self, id: Uuid) -> Result<Option<Quote>, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_quote"])
            .start_timer();

        let quote = sqlx::query_scalar::<_, Json<Quote>>(
            "SELECT document FROM quotes WHERE quote_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to get quote", e))?;

        timer.observe_duration();

        Ok(quote.map(|Json(q)| q))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn order(&self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let order = sqlx::query_scalar::<_, Json<WorkOrder>>(
            "SELECT document FROM work_orders WHERE order_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to get order", e))?;

        timer.observe_duration();

        Ok(order.map(|Json(o)| o))
    }

    #[instrument(skip(self))]
    async fn list_quotes(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<Quote>, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["list_quotes"])
            .start_timer();

        let rows = sqlx::query_scalar::<_, Json<Quote>>(
            r#"
            SELECT document FROM quotes
            WHERE ($1::timestamptz IS NULL OR (created_utc, quote_id) < ($1, $2))
            ORDER BY created_utc DESC, quote_id DESC
            LIMIT $3
            "#,
        )
        .bind(after.map(|c| c.created_utc))
        .bind(after.map(|c| c.id))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to list quotes", e))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(|Json(q)| q).collect())
    }

    #[instrument(skip(self))]
    async fn list_orders(
        &self,
        limit: u32,
        after: Option<PageCursor>,
    ) -> Result<Vec<WorkOrder>, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["list_orders"])
            .start_timer();

        let rows = sqlx::query_scalar::<_, Json<WorkOrder>>(
            r#"
            SELECT document FROM work_orders
            WHERE ($1::timestamptz IS NULL OR (created_utc, order_id) < ($1, $2))
            ORDER BY created_utc DESC, order_id DESC
            LIMIT $3
            "#,
        )
        .bind(after.map(|c| c.created_utc))
        .bind(after.map(|c| c.id))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to list orders", e))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(|Json(o)| o).collect())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn list_payments(&self, order_id: Uuid) -> Result<Vec<Payment>, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let rows = sqlx::query_scalar::<_, Json<Payment>>(
            r#"
            SELECT document FROM payments
            WHERE order_id = $1
            ORDER BY created_utc, payment_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to list payments", e))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(|Json(p)| p).collect())
    }

    async fn settings(&self) -> Result<Option<BusinessSettings>, WorkshopError> {
        let settings = sqlx::query_scalar::<_, Json<BusinessSettings>>(
            "SELECT document FROM business_settings WHERE settings_id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to get business settings", e))?;

        Ok(settings.map(|Json(s)| s))
    }

    #[instrument(skip(self, settings))]
    async fn save_settings(&self, settings: &BusinessSettings) -> Result<(), WorkshopError> {
        sqlx::query(
            r#"
            INSERT INTO business_settings (settings_id, document, updated_utc)
            VALUES (1, $1, NOW())
            ON CONFLICT (settings_id) DO UPDATE
            SET document = EXCLUDED.document, updated_utc = EXCLUDED.updated_utc
            "#,
        )
        .bind(Json(settings))
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to save business settings", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), WorkshopError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Health check failed", e))?;
        Ok(())
    }
}

/// Serializable transaction on a [`PgStore`]. Rolled back on drop unless
/// committed.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn quote(&mut self, id: Uuid) -> Result<Option<Quote>, WorkshopError> {
        let quote = sqlx::query_scalar::<_, Json<Quote>>(
            "SELECT document FROM quotes WHERE quote_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to lock quote", e))?;

        Ok(quote.map(|Json(q)| q))
    }

    async fn save_quote(&mut self, quote: &Quote) -> Result<(), WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["save_quote"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO quotes (quote_id, code, status, created_utc, document)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (quote_id) DO UPDATE
            SET status = EXCLUDED.status, document = EXCLUDED.document
            "#,
        )
        .bind(quote.id)
        .bind(&quote.code)
        .bind(quote.status.as_str())
        .bind(quote.created_utc)
        .bind(Json(quote))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to save quote", e))?;

        timer.observe_duration();
        Ok(())
    }

    async fn order(&mut self, id: Uuid) -> Result<Option<WorkOrder>, WorkshopError> {
        let order = sqlx::query_scalar::<_, Json<WorkOrder>>(
            "SELECT document FROM work_orders WHERE order_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to lock order", e))?;

        Ok(order.map(|Json(o)| o))
    }

    async fn save_order(&mut self, order: &WorkOrder) -> Result<(), WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["save_order"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO work_orders
                (order_id, quote_id, code, status, pay_status, created_utc, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id) DO UPDATE
            SET status = EXCLUDED.status,
                pay_status = EXCLUDED.pay_status,
                document = EXCLUDED.document
            "#,
        )
        .bind(order.id)
        .bind(order.quote_id)
        .bind(&order.code)
        .bind(order.status.as_str())
        .bind(order.pay_status.as_str())
        .bind(order.created_utc)
        .bind(Json(order))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to save order", e))?;

        timer.observe_duration();
        Ok(())
    }

    async fn payment(&mut self, id: Uuid) -> Result<Option<Payment>, WorkshopError> {
        let payment = sqlx::query_scalar::<_, Json<Payment>>(
            "SELECT document FROM payments WHERE payment_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to lock payment", e))?;

        Ok(payment.map(|Json(p)| p))
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["insert_payment"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO payments (payment_id, order_id, created_utc, document)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.created_utc)
        .bind(Json(payment))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to insert payment", e))?;

        timer.observe_duration();
        Ok(())
    }

    async fn delete_payment(&mut self, id: Uuid) -> Result<(), WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["delete_payment"])
            .start_timer();

        sqlx::query("DELETE FROM payments WHERE payment_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to delete payment", e))?;

        timer.observe_duration();
        Ok(())
    }

    async fn next_sequence(&mut self, key: &str) -> Result<i32, WorkshopError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["next_sequence"])
            .start_timer();

        let seq = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO sequence_counters (counter_key, seq)
            VALUES ($1, 1)
            ON CONFLICT (counter_key) DO UPDATE
            SET seq = sequence_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(key)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to allocate sequence", e))?;

        timer.observe_duration();
        Ok(seq)
    }

    async fn commit(self) -> Result<(), WorkshopError> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error("Failed to commit transaction", e))
    }
}
