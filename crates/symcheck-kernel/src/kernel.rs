//! Kernel boot and request flows.

use crate::error::KernelError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use symcheck_memory::{HistoryStore, MemoryError};
use symcheck_runtime::drivers::create_driver;
use symcheck_runtime::fallback::{AnalysisOutcome, FallbackSelector};
use symcheck_runtime::llm_driver::{DriverConfig, LlmDriver};
use symcheck_types::config::SymcheckConfig;
use symcheck_types::history::HistoryRecord;
use tracing::{error, info};

/// Outcome of one analysis together with the history row it produced.
#[derive(Debug, Clone)]
pub struct AnalysisRecorded {
    pub outcome: AnalysisOutcome,
    pub record: HistoryRecord,
}

/// Point-in-time health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct KernelHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub candidates: Vec<String>,
    pub analyses_total: u64,
    pub degraded_total: u64,
}

/// Open the configured history store without booting a driver.
pub fn open_history(config: &SymcheckConfig) -> Result<HistoryStore, KernelError> {
    Ok(HistoryStore::open(config.history_db_path())?)
}

/// Long-lived service state, built once at startup.
pub struct SymcheckKernel {
    config: SymcheckConfig,
    selector: FallbackSelector,
    history: HistoryStore,
    analyses_total: AtomicU64,
    degraded_total: AtomicU64,
}

impl SymcheckKernel {
    /// Boot from config, resolving the API key from the environment.
    pub fn boot_with_config(config: SymcheckConfig) -> Result<Self, KernelError> {
        config.validate()?;

        let env_var = config.completion.api_key_env.clone();
        let api_key = std::env::var(&env_var)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| KernelError::MissingApiKey(env_var.clone()))?;

        let driver = create_driver(&DriverConfig {
            provider: config.completion.provider.clone(),
            api_key: Some(api_key),
            base_url: Some(config.completion.base_url.clone()),
            timeout_secs: config.completion.request_timeout_secs,
        })?;

        Self::boot_with_driver(config, driver)
    }

    /// Boot with an already-built driver.
    pub fn boot_with_driver(
        config: SymcheckConfig,
        driver: Arc<dyn LlmDriver>,
    ) -> Result<Self, KernelError> {
        config.validate()?;

        let history = open_history(&config)?;
        let selector = FallbackSelector::new(driver, config.completion.candidates.clone())
            .with_max_tokens(config.completion.max_tokens);

        info!(
            provider = %config.completion.provider,
            candidates = ?config.completion.candidates,
            db = %history.db_path().display(),
            "Kernel booted"
        );

        Ok(Self {
            config,
            selector,
            history,
            analyses_total: AtomicU64::new(0),
            degraded_total: AtomicU64::new(0),
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &SymcheckConfig {
        &self.config
    }

    /// Run the fallback loop and record the outcome.
    ///
    /// Provider exhaustion is not an error here; it yields a degraded
    /// outcome that is still recorded. Only store failures are returned.
    pub async fn analyze_and_record(&self, symptoms: &str) -> Result<AnalysisRecorded, KernelError> {
        let outcome = self.selector.analyze(symptoms).await;

        self.analyses_total.fetch_add(1, Ordering::Relaxed);
        if outcome.degraded {
            self.degraded_total.fetch_add(1, Ordering::Relaxed);
            error!(
                attempts = outcome.attempts,
                "All candidate models failed; returning fallback message"
            );
        }

        let symptoms = symptoms.to_string();
        let result = outcome.text.clone();
        let model_used = outcome.model_used.clone();
        let record = self
            .with_history(move |store| store.append(&symptoms, &result, &model_used))
            .await?;

        Ok(AnalysisRecorded { outcome, record })
    }

    /// Stored history, newest first.
    pub async fn list_history(
        &self,
        keyword: Option<String>,
    ) -> Result<Vec<HistoryRecord>, KernelError> {
        self.with_history(move |store| store.list(keyword.as_deref()))
            .await
    }

    /// Delete one history entry.
    pub async fn delete_history_entry(&self, id: i64) -> Result<(), KernelError> {
        self.with_history(move |store| store.delete_one(id)).await
    }

    /// Delete all history, returning the number of rows removed.
    pub async fn clear_history(&self) -> Result<usize, KernelError> {
        self.with_history(|store| store.delete_all()).await
    }

    /// Counters and configuration summary.
    pub fn health(&self) -> KernelHealth {
        KernelHealth {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            provider: self.config.completion.provider.clone(),
            candidates: self.selector.candidates().to_vec(),
            analyses_total: self.analyses_total.load(Ordering::Relaxed),
            degraded_total: self.degraded_total.load(Ordering::Relaxed),
        }
    }

    /// Log shutdown. Connections are per-operation, so nothing is held open.
    pub fn shutdown(&self) {
        info!(
            analyses_total = self.analyses_total.load(Ordering::Relaxed),
            degraded_total = self.degraded_total.load(Ordering::Relaxed),
            "Kernel shutting down"
        );
    }

    /// Run a store operation on the blocking pool.
    async fn with_history<T, F>(&self, op: F) -> Result<T, KernelError>
    where
        T: Send + 'static,
        F: FnOnce(HistoryStore) -> Result<T, MemoryError> + Send + 'static,
    {
        let store = self.history.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| KernelError::Task(e.to_string()))?
            .map_err(KernelError::from)
    }
}
