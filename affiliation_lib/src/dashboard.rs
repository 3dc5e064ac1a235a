//! The report page's state: filters, the two report tabs and their requests.
//!
//! Request errors stop here. Each tab keeps its own [`QueryState`], so a
//! failed request is something to render, never a crash.

use std::sync::Arc;

use affiliation_api::types::{ApiResponse, MetaInfo, ReportRow, SummaryRow};
use chrono::NaiveDate;

use crate::client::ReportClient;
use crate::error::{ErrorMessage, ValidationErrors};
use crate::filter::{ActiveQuery, FilterStore};
use crate::validation::{validate_report_form, ReportForm};

pub const DETAIL_EMPTY_MESSAGE: &str = "No affiliation reports found for the given criteria";
pub const DETAIL_LOADING_MESSAGE: &str = "Loading detailed reports...";
pub const SUMMARY_EMPTY_MESSAGE: &str = "No summary data found for the given criteria";
pub const SUMMARY_LOADING_MESSAGE: &str = "Loading summary data...";

/// Lifecycle of one tab's request.
#[derive(Clone, Debug)]
pub enum QueryState<T> {
    /// Not enabled: no filter, or the other tab is active.
    Idle,
    Loading,
    Loaded(ApiResponse<T>),
    Failed(ErrorMessage),
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        QueryState::Idle
    }
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&ApiResponse<T>> {
        match self {
            QueryState::Loaded(resp) => Some(resp),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorMessage> {
        match self {
            QueryState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Text for the table body when there are no rows to show.
    fn placeholder(&self, loading: &'static str, empty: &'static str) -> Option<&'static str> {
        match self {
            QueryState::Loading => Some(loading),
            QueryState::Loaded(resp) if !resp.data.is_empty() => None,
            QueryState::Failed(_) => None,
            _ => Some(empty),
        }
    }
}

/// Pagination footer values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: i64,
    pub page_size: i64,
    pub total: i64,
    pub last_page: i64,
}

impl PageInfo {
    fn from_meta(meta: &MetaInfo, page_size: i64) -> Self {
        Self {
            current_page: meta.current_page.max(1),
            page_size,
            total: meta.total,
            last_page: meta.last_page.max(1),
        }
    }
}

pub struct ReportDashboard {
    filters: FilterStore,
    client: Arc<ReportClient>,
    detail: QueryState<ReportRow>,
    summary: QueryState<SummaryRow>,
}

impl ReportDashboard {
    pub fn new(client: Arc<ReportClient>, filters: FilterStore) -> Self {
        Self {
            filters,
            client,
            detail: QueryState::Idle,
            summary: QueryState::Idle,
        }
    }

    /// Restores the page from its URL query string.
    pub fn from_query_string(client: Arc<ReportClient>, query: &str) -> Self {
        Self::new(client, FilterStore::from_query_string(query))
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn detail(&self) -> &QueryState<ReportRow> {
        &self.detail
    }

    pub fn summary(&self) -> &QueryState<SummaryRow> {
        &self.summary
    }

    /// Form values to pre-fill from the current URL.
    pub fn form_defaults(&self) -> ReportForm {
        let c = self.filters.criteria();
        ReportForm {
            input_value: c.code.clone(),
            from_date: c.start_date,
            to_date: c.end_date,
            summary: c.summary,
            data_type: Some(c.data_type.unwrap_or_default()),
        }
    }

    /// Validates the form, then loads page 1 of the chosen report.
    /// Validation failures leave the filter state alone.
    pub async fn submit_form(
        &mut self,
        form: &ReportForm,
        today: NaiveDate,
    ) -> Result<(), ValidationErrors> {
        let validated = validate_report_form(form, today)?;
        self.filters.submit(validated);
        self.refresh().await;
        Ok(())
    }

    pub async fn set_page(&mut self, page: i64) {
        self.filters.set_page(page);
        self.refresh().await;
    }

    pub async fn set_page_size(&mut self, page_size: i64) {
        self.filters.set_page_size(page_size);
        self.refresh().await;
    }

    pub async fn set_summary(&mut self, summary: bool) {
        self.filters.set_summary(summary);
        self.refresh().await;
    }

    /// Runs whichever query the filters enable. The other tab goes idle.
    pub async fn refresh(&mut self) {
        match self.filters.active_query() {
            ActiveQuery::Idle => {
                self.detail = QueryState::Idle;
                self.summary = QueryState::Idle;
            }
            ActiveQuery::Detail(query) => {
                self.summary = QueryState::Idle;
                self.detail = QueryState::Loading;
                self.detail = match self.client.fetch_detail(&query).await {
                    Ok(resp) => QueryState::Loaded(resp),
                    Err(e) => {
                        tracing::error!("detail report failed: {}", e);
                        QueryState::Failed(ErrorMessage::from(&e))
                    }
                };
            }
            ActiveQuery::Summary(query) => {
                self.detail = QueryState::Idle;
                self.summary = QueryState::Loading;
                self.summary = match self.client.fetch_summary(&query).await {
                    Ok(resp) => QueryState::Loaded(resp),
                    Err(e) => {
                        tracing::error!("summary report failed: {}", e);
                        QueryState::Failed(ErrorMessage::from(&e))
                    }
                };
            }
        }
    }

    /// Error of the visible tab, if its request failed.
    pub fn error(&self) -> Option<&ErrorMessage> {
        if self.filters.criteria().summary {
            self.summary.error()
        } else {
            self.detail.error()
        }
    }

    /// Placeholder text for the visible tab, when it has no rows.
    pub fn empty_state_message(&self) -> Option<&'static str> {
        if self.filters.criteria().summary {
            self.summary
                .placeholder(SUMMARY_LOADING_MESSAGE, SUMMARY_EMPTY_MESSAGE)
        } else {
            self.detail
                .placeholder(DETAIL_LOADING_MESSAGE, DETAIL_EMPTY_MESSAGE)
        }
    }

    /// Pagination for the visible tab, once it has loaded.
    pub fn page_info(&self) -> Option<PageInfo> {
        let page_size = self.filters.criteria().page_size;
        if self.filters.criteria().summary {
            self.summary
                .data()
                .map(|r| PageInfo::from_meta(&r.meta_info, page_size))
        } else {
            self.detail
                .data()
                .map(|r| PageInfo::from_meta(&r.meta_info, page_size))
        }
    }
}
