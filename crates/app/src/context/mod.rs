//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use pdpsync_core::{
    CallRepository, Clock, ProviderRegistry, SyncContext, SyncEngine, SystemClock, TokenManager,
};
use pdpsync_domain::{Config, PdpError, Result, SyncReport};
use pdpsync_infra::{
    DbManager, InboxImporter, PdpApiClient, SqliteCallRepository, SqliteDocumentRepository,
    SqliteFlowLedger, SqliteInvoiceGateway, SqliteTokenStore, SyncScheduler, SyncSchedulerConfig,
};
use tracing::{error, info, warn};

/// Holds every service of a running instance
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub registry: ProviderRegistry,
    pub tokens: Arc<TokenManager>,
    pub scheduler: SyncScheduler,
}

impl AppContext {
    /// Open the database, apply migrations and build one sync context per
    /// configured provider.
    ///
    /// # Errors
    /// Database setup failures and provider configuration errors.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let calls: Arc<dyn CallRepository> = Arc::new(SqliteCallRepository::new(db.clone()));
        let tokens =
            Arc::new(TokenManager::new(Arc::new(SqliteTokenStore::new(db.clone())), clock.clone()));
        let invoices = Arc::new(SqliteInvoiceGateway::new(db.clone(), clock.clone()));
        let documents = Arc::new(SqliteDocumentRepository::new(db.clone()));
        let ledger = Arc::new(SqliteFlowLedger::new(db.clone(), clock.clone()));
        let importer = Arc::new(InboxImporter::new(&config.inbox_dir, invoices.clone()));

        let mut registry = ProviderRegistry::new();
        for provider in &config.providers {
            registry.register(
                provider.name.as_str(),
                PdpApiClient::factory(tokens.clone(), calls.clone(), clock.clone()),
            );
        }

        let contexts = config
            .providers
            .iter()
            .map(|provider| {
                Ok(SyncContext {
                    provider: registry.create(provider)?,
                    documents: documents.clone(),
                    calls: calls.clone(),
                    invoices: invoices.clone(),
                    importer: importer.clone(),
                    ledger: ledger.clone(),
                    clock: clock.clone(),
                    debug: config.sync.debug,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scheduler = SyncScheduler::new(
            SyncEngine::new(),
            contexts,
            SyncSchedulerConfig::from_sync_config(&config.sync),
        );

        info!(
            database = %db.path().display(),
            providers = ?registry.names(),
            "Application context initialized"
        );
        Ok(Self { config, db, registry, tokens, scheduler })
    }

    /// Start periodic synchronization when enabled.
    ///
    /// # Errors
    /// Returns [`PdpError::Internal`] when the scheduler does not start within 10 s.
    pub async fn start(&mut self) -> Result<()> {
        if !self.config.sync.enabled {
            warn!("Synchronization disabled by configuration, scheduler not started");
            return Ok(());
        }

        tokio::time::timeout(Duration::from_secs(10), self.scheduler.start())
            .await
            .map_err(|_| {
                error!(timeout_secs = 10, "SyncScheduler start timed out");
                PdpError::Internal("SyncScheduler start timed out after 10s".into())
            })?
            .map_err(|err| {
                error!(error = %err, "failed to start SyncScheduler");
                PdpError::from(err)
            })
    }

    /// One synchronization pass over every provider.
    pub async fn sync_once(&self) -> Vec<SyncReport> {
        self.scheduler.run_once().await
    }

    /// Database reachability followed by each provider's health endpoint.
    pub async fn health_check(&self) -> Result<Vec<(String, bool)>> {
        self.db.health_check()?;

        let mut health = Vec::with_capacity(self.config.providers.len());
        for provider in &self.config.providers {
            let reachable = self.registry.create(provider)?.check_health().await?;
            if !reachable {
                warn!(provider = %provider.name, "PDP provider unreachable");
            }
            health.push((provider.name.clone(), reachable));
        }
        Ok(health)
    }

    /// Stop the scheduler if it is running.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.scheduler.is_running() {
            self.scheduler.stop().await?;
        }
        info!("Application context shut down");
        Ok(())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("database", &self.db.path())
            .field("registry", &self.registry)
            .field("scheduler_running", &self.scheduler.is_running())
            .finish_non_exhaustive()
    }
}
