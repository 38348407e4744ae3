//! Server state management.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use sitestats_core::config::StoreConfig;
use sitestats_core::error::{SiteStatsError, StatsResult};
use sitestats_core::SqliteStore;

use crate::error::{ApiError, ApiResult};

/// Retry policy for writes that hit a busy database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 50,
            max_delay_ms: 1_000,
            multiplier: 2.0_f32,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_max_times(self.max_retries as usize)
            .with_min_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_factor(self.multiplier)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub config: Arc<StoreConfig>,
    pub retry: RetryPolicy,
}

impl AppState {
    /// Create a new application state around an open store.
    pub fn new(store: SqliteStore, config: StoreConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            retry: RetryPolicy::default(),
        }
    }

    /// Open the store named by the configuration.
    pub fn open(config: StoreConfig) -> StatsResult<Self> {
        let store = SqliteStore::new(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "Opened site store");
        Ok(Self::new(store, config))
    }

    /// Create with an in-memory store (for testing).
    pub fn in_memory() -> StatsResult<Self> {
        Ok(Self::new(SqliteStore::in_memory()?, StoreConfig::default()))
    }

    /// Builder: set retry policy
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Run a store operation on the blocking pool.
    pub async fn blocking<F, T>(&self, op: F) -> ApiResult<T>
    where
        F: FnOnce(&SqliteStore) -> StatsResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || op(&store)).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => Err(ApiError::internal(format!("Store task failed: {}", e))),
        }
    }

    /// Run a write on the blocking pool, retrying while the database is busy.
    ///
    /// Domain failures (duplicates, stale edits, bad input) are returned on
    /// the first attempt.
    pub async fn write_with_retry<F, T>(&self, op: F) -> ApiResult<T>
    where
        F: Fn(&SqliteStore) -> StatsResult<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let op = Arc::new(op);
        let attempt = || {
            let store = Arc::clone(&self.store);
            let op = Arc::clone(&op);
            async move {
                match tokio::task::spawn_blocking(move || op(&store)).await {
                    Ok(result) => result,
                    Err(e) => Err(SiteStatsError::Internal(format!("Store task failed: {}", e))),
                }
            }
        };

        attempt
            .retry(self.retry.backoff())
            .when(|e: &SiteStatsError| e.is_retryable())
            .notify(|err, dur| {
                tracing::warn!("Store busy, retrying in {:?}: {}", dur, err);
            })
            .await
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestats_core::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            multiplier: 1.0,
        }
    }

    fn busy() -> SiteStatsError {
        SiteStatsError::Database {
            message: "database is locked".to_string(),
            code: ErrorCode::DbBusy,
            source: None,
        }
    }

    #[tokio::test]
    async fn test_busy_writes_are_retried() {
        let state = AppState::in_memory().unwrap().with_retry(fast_retry());
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let result = state
            .write_with_retry(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(busy())
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_domain_errors_are_not_retried() {
        let state = AppState::in_memory().unwrap().with_retry(fast_retry());
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let err = state
            .write_with_retry(move |_| -> StatsResult<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SiteStatsError::non_current_edit(1))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, "SITE_003");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
