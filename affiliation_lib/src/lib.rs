//! Library layer for the affiliation reports dashboard: filter state, date
//! rules, session handling and a cached, retrying report client.
//!
//! Wraps the `affiliation_api` crate. Consumers hold a [`ReportDashboard`] for
//! page state and a [`SessionManager`] for login.

pub mod cache;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod date_range;
pub mod error;
pub mod filter;
pub mod navigation;
pub mod query_builder;
pub mod session;
pub mod validation;

pub use affiliation_api;
pub use affiliation_api::types;
pub use affiliation_api::{Query, ReportQuery, SummaryQuery};

pub use cache::MemoryCache;
pub use client::{ReportClient, RetryConfig};
pub use config::{ConfigError, DashboardConfig, Services};
pub use dashboard::{PageInfo, QueryState, ReportDashboard};
pub use date_range::{DateRangePicker, DateRangeSelection, DisableContext, DisableRules};
pub use error::{DashboardError, ErrorMessage, FieldError, ValidationErrors};
pub use filter::{ActiveQuery, FilterCriteria, FilterPatch, FilterStore};
pub use navigation::{Navigator, RecordingNavigator, RedirectGuard, LOGIN_ROUTE, ROOT_ROUTE};
pub use session::{
    ExpiryPolicy, LoginOutcome, Session, SessionContext, SessionCookie, SessionManager,
    SessionState,
};
pub use validation::{ReportForm, ValidatedReportForm};
