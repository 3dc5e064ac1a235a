//! Report client: session-aware, retrying and cached wrapper around the API client.

use std::sync::Arc;
use std::time::Duration;

use affiliation_api::types::{ApiResponse, DataType, ReportRow, SummaryRow};
use affiliation_api::{Client, Query, QueryCommon, ReportQuery, SummaryQuery};
use rand::Rng;

use crate::cache::MemoryCache;
use crate::error::{DashboardError, ValidationErrors};
use crate::navigation::{Navigator, RedirectGuard};
use crate::session::SessionContext;
use crate::validation::FIELD_DATA_TYPE;

/// Automatic retries after the first attempt of a report request.
pub const MAX_RETRIES: usize = 2;

/// Backoff between attempts of one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

/// Transport failures, rate limiting and server faults are worth another try.
/// Client errors, `401` included, are not.
fn is_retryable(err: &affiliation_api::Error) -> bool {
    use affiliation_api::Error as ApiError;
    match err {
        ApiError::RequestFailed | ApiError::Timeout => true,
        ApiError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        ApiError::ParseFailed(_) => false,
    }
}

/// Rows are decoded by data type, so a query without one is never sent.
fn required_data_type(common: &QueryCommon) -> Result<DataType, DashboardError> {
    common.data_type.ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.push(FIELD_DATA_TYPE, "Please select a type");
        DashboardError::Validation(errors)
    })
}

/// Fetches report pages for the current session.
///
/// Every request carries the session's bearer token when there is one. A `401`
/// sends the user to the login page through the [`RedirectGuard`], so several
/// concurrent rejections navigate once.
pub struct ReportClient {
    inner: Client,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
    guard: Arc<RedirectGuard>,
    cache: Arc<MemoryCache>,
    retry: RetryConfig,
}

impl ReportClient {
    pub fn new(inner: Client, session: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner,
            session,
            navigator,
            guard: Arc::new(RedirectGuard::new()),
            cache: Arc::new(MemoryCache::default()),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_redirect_guard(mut self, guard: Arc<RedirectGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_cache(mut self, cache: Arc<MemoryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    pub fn redirect_guard(&self) -> &Arc<RedirectGuard> {
        &self.guard
    }

    async fn retrying<T, F, Fut>(&self, label: &str, mut f: F) -> Result<T, affiliation_api::Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, affiliation_api::Error>>,
    {
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.retry.max_retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:.1}s",
                        label,
                        attempt,
                        self.retry.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn reject(&self, err: affiliation_api::Error) -> DashboardError {
        if err.is_unauthorized() {
            self.guard.redirect_to_login(self.navigator.as_ref());
        }
        DashboardError::from(err)
    }

    /// Fetches a page of the detail report.
    pub async fn fetch_detail(
        &self,
        query: &ReportQuery,
    ) -> Result<ApiResponse<ReportRow>, DashboardError> {
        let data_type = required_data_type(&query.common)?;
        let cache_key = format!("reports:{}", query.to_query_string());

        let raw = match self.cache.get_json::<ApiResponse<serde_json::Value>>(&cache_key)? {
            Some(cached) => {
                tracing::debug!("cache hit for {}", cache_key);
                cached
            }
            None => {
                let token = self.session.access_token();
                let resp = self
                    .retrying("reports", || {
                        self.inner.get_reports_raw(query, token.as_deref())
                    })
                    .await
                    .map_err(|e| self.reject(e))?;
                self.cache.set_json(cache_key, &resp);
                resp
            }
        };

        raw.try_map_data(|row| ReportRow::from_value(data_type, row))
            .map_err(|e| {
                tracing::error!("Failed to decode {} report row: {}", data_type, e);
                DashboardError::Unknown(e.to_string())
            })
    }

    /// Fetches a page of the summary report. Needs a live session; without
    /// one nothing is sent.
    pub async fn fetch_summary(
        &self,
        query: &SummaryQuery,
    ) -> Result<ApiResponse<SummaryRow>, DashboardError> {
        let data_type = required_data_type(&query.common)?;
        let cache_key = format!("summaries:{}", query.to_query_string());

        let raw = match self.cache.get_json::<ApiResponse<serde_json::Value>>(&cache_key)? {
            Some(cached) => {
                tracing::debug!("cache hit for {}", cache_key);
                cached
            }
            None => {
                let token = self
                    .session
                    .access_token()
                    .ok_or_else(|| DashboardError::Authentication("Authentication required".to_string()))?;
                let resp = self
                    .retrying("summaries", || {
                        self.inner.get_summaries_raw(query, Some(token.as_str()))
                    })
                    .await
                    .map_err(|e| self.reject(e))?;
                self.cache.set_json(cache_key, &resp);
                resp
            }
        };

        raw.try_map_data(|row| SummaryRow::from_value(data_type, row))
            .map_err(|e| {
                tracing::error!("Failed to decode {} summary row: {}", data_type, e);
                DashboardError::Unknown(e.to_string())
            })
    }
}
