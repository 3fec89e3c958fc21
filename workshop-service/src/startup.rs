//! Assembly of the workshop services over one store.

use crate::config::WorkshopConfig;
use crate::error::WorkshopError;
use crate::models::BusinessSettings;
use crate::services::{
    dashboard, init_metrics, DashboardStats, OrderService, PaymentJournal, QuoteService,
    SequenceAllocator,
};
use crate::store::{DocumentStore, MemoryStore, PgStore};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Install tracing and register metrics.
pub fn init_telemetry(config: &WorkshopConfig) -> Result<(), WorkshopError> {
    service_core::observability::init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )
    .map_err(|e| WorkshopError::Config(anyhow::Error::new(e)))?;
    init_metrics();
    Ok(())
}

/// The quote, order and payment services sharing one store.
pub struct Workshop<S: DocumentStore> {
    store: Arc<S>,
    quotes: QuoteService<S>,
    orders: OrderService<S>,
    payments: PaymentJournal<S>,
    sequences: SequenceAllocator<S>,
}

impl<S: DocumentStore> Workshop<S> {
    pub fn new(store: S, config: &WorkshopConfig) -> Result<Self, WorkshopError> {
        let store = Arc::new(store);
        let retry = config.retry_config();
        let currency = config.currency()?;

        Ok(Self {
            quotes: QuoteService::new(Arc::clone(&store), retry.clone(), currency),
            orders: OrderService::new(Arc::clone(&store), retry.clone()),
            payments: PaymentJournal::new(Arc::clone(&store), retry.clone()),
            sequences: SequenceAllocator::new(Arc::clone(&store), retry),
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn quotes(&self) -> &QuoteService<S> {
        &self.quotes
    }

    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    pub fn payments(&self) -> &PaymentJournal<S> {
        &self.payments
    }

    pub fn sequences(&self) -> &SequenceAllocator<S> {
        &self.sequences
    }

    /// Branding used by printed documents. Empty until saved.
    pub async fn settings(&self) -> Result<BusinessSettings, WorkshopError> {
        Ok(self.store.settings().await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: BusinessSettings) -> Result<(), WorkshopError> {
        settings.validate()?;
        self.store.save_settings(&settings).await?;
        info!(name = %settings.name, "Business settings saved");
        Ok(())
    }

    /// Quote and order counts with paid and outstanding totals.
    pub async fn dashboard(&self) -> Result<DashboardStats, WorkshopError> {
        dashboard::dashboard(self.store.as_ref()).await
    }

    pub async fn health_check(&self) -> Result<(), WorkshopError> {
        self.store.health_check().await
    }
}

impl Workshop<PgStore> {
    /// Connect to Postgres and apply pending migrations.
    pub async fn connect(config: &WorkshopConfig) -> Result<Self, WorkshopError> {
        let store = PgStore::connect(config.database_url()?, &config.database).await?;
        store.run_migrations().await?;
        Self::new(store, config)
    }
}

impl Workshop<MemoryStore> {
    pub fn in_memory(config: &WorkshopConfig) -> Result<Self, WorkshopError> {
        Self::new(MemoryStore::new(), config)
    }
}
