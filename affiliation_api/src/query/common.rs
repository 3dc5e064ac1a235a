//! Shared query infrastructure: the [`Query`] trait and [`QueryCommon`] fields.

use chrono::NaiveDate;
use url::Url;

use crate::types::DataType;

/// Page requested when none is given.
pub const DEFAULT_PAGE: i64 = 1;
/// Rows per page when none is given.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Wire format for `start_date` / `end_date`.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait implemented by all query builders. Provides URL serialization, the
/// mirrored JSON body, and shared builder methods for filters and pagination.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// The JSON body sent alongside the query string. The backend reads both.
    fn to_body(&self) -> serde_json::Value;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Renders only the query string (no leading `?`).
    fn to_query_string(&self) -> String {
        // The base is never visible to callers; it only anchors the serializer.
        Url::parse("http://localhost/")
            .ok()
            .and_then(|base| self.add_to_url(&base).query().map(str::to_string))
            .unwrap_or_default()
    }

    /// Filters by affiliation code. An empty code means "no filter".
    fn with_code(mut self, code: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().code = code.to_string();
        self
    }

    /// Filters by first day of the range (inclusive).
    fn with_start_date(mut self, start_date: NaiveDate) -> Self
    where
        Self: Sized,
    {
        self.get_common().start_date = Some(start_date);
        self
    }

    /// Filters by last day of the range (inclusive).
    fn with_end_date(mut self, end_date: NaiveDate) -> Self
    where
        Self: Sized,
    {
        self.get_common().end_date = Some(end_date);
        self
    }

    /// Selects sales or registration data.
    fn with_data_type(mut self, data_type: DataType) -> Self
    where
        Self: Sized,
    {
        self.get_common().data_type = Some(data_type);
        self
    }

    /// Sets the page number (1-indexed).
    fn with_page(mut self, page: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page = page;
        self
    }

    /// Sets the number of results per page.
    fn with_page_size(mut self, page_size: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page_size = page_size;
        self
    }
}

/// Fields shared by the detail and summary queries: filters and pagination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryCommon {
    /// Affiliation code. Empty means unfiltered and is never sent in the query string.
    pub code: String,
    /// First day of the range, app time zone.
    pub start_date: Option<NaiveDate>,
    /// Last day of the range, app time zone.
    pub end_date: Option<NaiveDate>,
    /// Sales or registration.
    pub data_type: Option<DataType>,
    /// Page number (1-indexed). Defaults to 1.
    pub page: i64,
    /// Results per page. Defaults to 10.
    pub page_size: i64,
}

impl Default for QueryCommon {
    fn default() -> QueryCommon {
        QueryCommon {
            code: String::new(),
            start_date: None,
            end_date: None,
            data_type: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryCommon {
    /// Appends the filter and pagination parameters to the URL.
    ///
    /// Empty filters are left out entirely; pagination is always present.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if !self.code.is_empty() {
            url.query_pairs_mut().append_pair("code", &self.code);
        }
        if let Some(start_date) = self.start_date {
            url.query_pairs_mut()
                .append_pair("start_date", &start_date.format(DATE_FORMAT).to_string());
        };
        if let Some(end_date) = self.end_date {
            url.query_pairs_mut()
                .append_pair("end_date", &end_date.format(DATE_FORMAT).to_string());
        };
        if let Some(data_type) = self.data_type {
            url.query_pairs_mut()
                .append_pair("data_type", data_type.as_str());
        }
        url.query_pairs_mut()
            .append_pair("page", &self.page.to_string());
        url.query_pairs_mut()
            .append_pair("page_size", &self.page_size.to_string());
        url
    }

    /// The body fields shared by both variants. Absent filters are sent as
    /// empty strings, matching what the backend has always received.
    pub fn body_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut body = serde_json::Map::new();
        body.insert("code".into(), self.code.clone().into());
        body.insert(
            "start_date".into(),
            self.start_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
                .into(),
        );
        body.insert(
            "end_date".into(),
            self.end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
                .into(),
        );
        body.insert(
            "data_type".into(),
            self.data_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default()
                .into(),
        );
        body.insert("page".into(), self.page.into());
        body.insert("page_size".into(), self.page_size.into());
        body
    }
}
