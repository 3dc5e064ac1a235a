//! Dashboard settings: built-in defaults, then an optional TOML file, then
//! environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use affiliation_api::{Client, DEFAULT_BASE_URL, REQUEST_TIMEOUT};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::{MemoryCache, DEFAULT_CACHE_TTL};
use crate::client::{ReportClient, RetryConfig};
use crate::error::DashboardError;
use crate::navigation::{Navigator, RedirectGuard};
use crate::session::{ExpiryPolicy, SessionContext, SessionCookie, SessionManager, SESSION_MAX_AGE};

pub const ENV_BASE_URL: &str = "AFFILIATION_API_BASE_URL";
pub const ENV_BASE_URL_LEGACY: &str = "NEXT_PUBLIC_API_BASE_URL";
pub const ENV_SESSION_SECRET: &str = "AFFILIATION_SESSION_SECRET";
pub const ENV_RETRY_BASE_MS: &str = "AFFILIATION_RETRY_BASE_MS";
pub const ENV_CACHE_TTL_SECS: &str = "AFFILIATION_CACHE_TTL_SECS";
pub const ENV_EXPIRY_POLICY: &str = "AFFILIATION_EXPIRY_POLICY";
pub const ENV_SESSION_FILE: &str = "AFFILIATION_SESSION_FILE";

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    TomlParse(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub retry_base_ms: u64,
    pub cache_ttl_secs: u64,
    pub session_secret: Option<String>,
    pub session_max_age_secs: u64,
    pub expiry_policy: ExpiryPolicy,
    pub session_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            retry_base_ms: RetryConfig::default().base_delay_ms,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            session_secret: None,
            session_max_age_secs: SESSION_MAX_AGE.as_secs(),
            expiry_policy: ExpiryPolicy::default(),
            session_file: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))
    }

    /// Overrides fields from whatever `lookup` finds. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BASE_URL).or_else(|| get(ENV_BASE_URL_LEGACY)) {
            self.base_url = url;
        }
        if let Some(secret) = get(ENV_SESSION_SECRET) {
            self.session_secret = Some(secret);
        }
        if let Some(value) = get(ENV_RETRY_BASE_MS) {
            self.retry_base_ms = parse_number(ENV_RETRY_BASE_MS, &value)?;
        }
        if let Some(value) = get(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = parse_number(ENV_CACHE_TTL_SECS, &value)?;
        }
        if let Some(value) = get(ENV_EXPIRY_POLICY) {
            self.expiry_policy = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_EXPIRY_POLICY,
                value: value.clone(),
            })?;
        }
        if let Some(path) = get(ENV_SESSION_FILE) {
            self.session_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::default().with_base_delay_ms(self.retry_base_ms)
    }

    /// Cookie sealer, when a secret is configured.
    pub fn session_cookie(&self) -> Option<SessionCookie> {
        self.session_secret.as_ref().map(|secret| {
            SessionCookie::new(secret.as_bytes())
                .with_max_age(Duration::from_secs(self.session_max_age_secs))
        })
    }

    /// Wires a session manager and report client that share one session,
    /// cache and redirect guard.
    pub fn connect(&self, navigator: Arc<dyn Navigator>) -> Result<Services, DashboardError> {
        let api = Client::with_timeout(&self.base_url, self.request_timeout())?;
        let context = SessionContext::new(self.expiry_policy);
        let cache = Arc::new(MemoryCache::new(self.cache_ttl()));
        let guard = Arc::new(RedirectGuard::new());

        let sessions = SessionManager::new(api.clone(), context.clone())
            .with_cache(Arc::clone(&cache))
            .with_redirect_guard(Arc::clone(&guard));
        let reports = ReportClient::new(api, context, navigator)
            .with_cache(cache)
            .with_redirect_guard(guard)
            .with_retry(self.retry());

        Ok(Services {
            sessions,
            reports: Arc::new(reports),
        })
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

/// The wired-up pieces a consumer talks to.
pub struct Services {
    pub sessions: SessionManager,
    pub reports: Arc<ReportClient>,
}
