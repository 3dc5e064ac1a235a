//! Filter state mirrored in the page URL.
//!
//! The URL is the source of truth for which report is shown: every change goes
//! through [`FilterStore::update`], which merges the patch and re-serializes.
//! Parsing is lenient: unknown keys are ignored and a malformed value falls
//! back to that key's default. A date pair that is reversed or spans more
//! than three months is dropped as a whole.

use affiliation_api::types::DataType;
use affiliation_api::{ReportQuery, SummaryQuery, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use chrono::NaiveDate;
use url::form_urlencoded;

use crate::date_range::is_valid_range;
use crate::query_builder::{detail_query, summary_query};
use crate::validation::{ValidatedReportForm, MAX_PAGE_SIZE};

/// Page sizes offered by the pagination control.
pub const PAGE_SIZE_OPTIONS: [i64; 5] = [3, 5, 10, 20, 30];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What the dashboard is currently asked to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    pub code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_type: Option<DataType>,
    pub summary: bool,
    pub page: i64,
    pub page_size: i64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            code: String::new(),
            start_date: None,
            end_date: None,
            data_type: None,
            summary: false,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    /// True once any filter has been chosen. Without one neither report runs.
    pub fn has_active_filter(&self) -> bool {
        !self.code.is_empty()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.data_type.is_some()
    }

    /// Whether a report may be requested: the data type is known and the rows
    /// are narrowed by a code or by a complete, valid date range.
    pub fn is_scoped(&self) -> bool {
        let range = match (self.start_date, self.end_date) {
            (Some(from), Some(to)) => Some(is_valid_range(from, to)),
            _ => None,
        };
        self.data_type.is_some()
            && range != Some(false)
            && (!self.code.is_empty() || range == Some(true))
    }

    /// Parses a URL query string, with or without the leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        let mut criteria = Self::default();
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            // First occurrence wins, like URLSearchParams::get.
            if seen.iter().any(|k| *k == key) {
                continue;
            }
            seen.push(key.to_string());

            match &*key {
                "code" => criteria.code = value.into_owned(),
                "start_date" => criteria.start_date = parse_date(&value),
                "end_date" => criteria.end_date = parse_date(&value),
                "data_type" => criteria.data_type = value.parse().ok(),
                "summary" => criteria.summary = value == "true",
                "page" => criteria.page = parse_number(&value).map_or(DEFAULT_PAGE, normalize_page),
                "page_size" => {
                    criteria.page_size =
                        parse_number(&value).map_or(DEFAULT_PAGE_SIZE, normalize_page_size)
                }
                other => tracing::debug!("ignoring unknown filter key '{}'", other),
            }
        }

        if let (Some(from), Some(to)) = (criteria.start_date, criteria.end_date) {
            if !is_valid_range(from, to) {
                tracing::debug!("dropping date range {} to {}", from, to);
                criteria.start_date = None;
                criteria.end_date = None;
            }
        }
        criteria
    }

    /// Serializes in a fixed key order, leaving out every default value.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.code.is_empty() {
            out.append_pair("code", &self.code);
        }
        if let Some(start_date) = self.start_date {
            out.append_pair("start_date", &start_date.format(DATE_FORMAT).to_string());
        }
        if let Some(end_date) = self.end_date {
            out.append_pair("end_date", &end_date.format(DATE_FORMAT).to_string());
        }
        if let Some(data_type) = self.data_type {
            out.append_pair("data_type", data_type.as_str());
        }
        if self.summary {
            out.append_pair("summary", "true");
        }
        if self.page != DEFAULT_PAGE {
            out.append_pair("page", &self.page.to_string());
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            out.append_pair("page_size", &self.page_size.to_string());
        }
        out.finish()
    }

    /// The query that should run for these criteria, if any.
    pub fn active_query(&self) -> ActiveQuery {
        if !self.has_active_filter() || !self.is_scoped() {
            ActiveQuery::Idle
        } else if self.summary {
            ActiveQuery::Summary(summary_query(self))
        } else {
            ActiveQuery::Detail(detail_query(self))
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

fn parse_number(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}

fn normalize_page(page: i64) -> i64 {
    if page >= 1 {
        page
    } else {
        DEFAULT_PAGE
    }
}

fn normalize_page_size(page_size: i64) -> i64 {
    if (1..=MAX_PAGE_SIZE).contains(&page_size) {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Which report variant runs, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveQuery {
    /// No filter chosen yet; nothing is fetched.
    Idle,
    Detail(ReportQuery),
    Summary(SummaryQuery),
}

/// A partial update. `None` leaves a field alone.
///
/// The optional fields are doubly wrapped so a patch can clear them:
/// `Some(None)` removes the value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub code: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub data_type: Option<Option<DataType>>,
    pub summary: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl FilterPatch {
    pub fn with_summary(mut self, summary: bool) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Holds the criteria together with their serialized URL form.
#[derive(Clone, Debug, Default)]
pub struct FilterStore {
    criteria: FilterCriteria,
    query_string: String,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores state from a page URL's query string.
    pub fn from_query_string(query: &str) -> Self {
        let criteria = FilterCriteria::from_query_string(query);
        let query_string = criteria.to_query_string();
        Self {
            criteria,
            query_string,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The canonical URL form of the current criteria.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn has_active_filter(&self) -> bool {
        self.criteria.has_active_filter()
    }

    pub fn active_query(&self) -> ActiveQuery {
        self.criteria.active_query()
    }

    /// Merges `patch` and re-serializes. Returns the new URL query string.
    ///
    /// Out-of-range page numbers and sizes fall back to their defaults. A date
    /// change that would leave a reversed or over-long range is not applied.
    pub fn update(&mut self, patch: FilterPatch) -> &str {
        let c = &mut self.criteria;
        if let Some(code) = patch.code {
            c.code = code;
        }
        let previous = (c.start_date, c.end_date);
        if let Some(start_date) = patch.start_date {
            c.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            c.end_date = end_date;
        }
        if let (Some(from), Some(to)) = (c.start_date, c.end_date) {
            if !is_valid_range(from, to) {
                tracing::warn!("ignoring date range {} to {}", from, to);
                (c.start_date, c.end_date) = previous;
            }
        }
        if let Some(data_type) = patch.data_type {
            c.data_type = data_type;
        }
        if let Some(summary) = patch.summary {
            c.summary = summary;
        }
        if let Some(page) = patch.page {
            c.page = normalize_page(page);
        }
        if let Some(page_size) = patch.page_size {
            c.page_size = normalize_page_size(page_size);
        }
        self.query_string = self.criteria.to_query_string();
        tracing::debug!("filter state now '{}'", self.query_string);
        &self.query_string
    }

    /// Applies a validated report form. Always goes back to page 1.
    pub fn submit(&mut self, form: ValidatedReportForm) -> &str {
        self.update(FilterPatch {
            code: Some(form.code),
            start_date: Some(form.from_date),
            end_date: Some(form.to_date),
            data_type: Some(Some(form.data_type)),
            summary: Some(form.summary),
            page: Some(DEFAULT_PAGE),
            page_size: None,
        })
    }

    pub fn set_page(&mut self, page: i64) -> &str {
        self.update(FilterPatch::default().with_page(page))
    }

    /// Changing the page size restarts from page 1.
    pub fn set_page_size(&mut self, page_size: i64) -> &str {
        self.update(
            FilterPatch::default()
                .with_page(DEFAULT_PAGE)
                .with_page_size(page_size),
        )
    }

    /// Switches between the detail and summary views. Nothing else changes.
    pub fn set_summary(&mut self, summary: bool) -> &str {
        self.update(FilterPatch::default().with_summary(summary))
    }
}
