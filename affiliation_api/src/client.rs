//! HTTP client for the affiliation reporting API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{Query, ReportQuery, SummaryQuery},
    types::{ApiResponse, LoginRequest, LoginTokens, ReportRow, SummaryRow},
    Error,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://affiliation-api.gktechbd.com/api/v1";

/// Hard deadline for every request. A request that exceeds it fails with
/// [`Error::Timeout`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the affiliation reporting API.
///
/// Report endpoints are `POST` with the filters both in the query string and
/// in the JSON body. The access token is passed per call; the client itself
/// holds no session.
#[derive(Clone)]
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production API.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_BASE_URL, REQUEST_TIMEOUT)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Creates a new client with a custom base URL and request deadline.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    async fn post<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        body: &serde_json::Value,
        access_token: Option<&str>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let url = self.get_url(path, query)?;
        tracing::debug!("POST {}", url);

        let mut request = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/plain, */*")
            .json(body);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            tracing::error!("Failed to send request: {}", e);
            map_transport_error(&e)
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            map_transport_error(&e)
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            let (message, code) = structured_error(&body);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                message,
                code,
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::ParseFailed(e.to_string())
        })?;

        Ok(parsed)
    }

    /// Exchanges credentials for a token pair.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginTokens, Error> {
        let body = serde_json::to_value(request).map_err(|e| Error::ParseFailed(e.to_string()))?;
        let resp = self
            .post::<serde_json::Value, SummaryQuery>("/auth/login/", None, &body, None)
            .await?;
        LoginTokens::from_response(&resp).ok_or_else(|| {
            tracing::error!("Login response did not include an access token");
            Error::ParseFailed("login response did not include an access token".to_string())
        })
    }

    /// Fetches a page of the detail report without decoding the rows.
    pub async fn get_reports_raw(
        &self,
        query: &ReportQuery,
        access_token: Option<&str>,
    ) -> Result<ApiResponse<serde_json::Value>, Error> {
        self.post("/reports/", Some(query), &query.to_body(), access_token)
            .await
    }

    /// Fetches a page of the detail report.
    pub async fn get_reports(
        &self,
        query: &ReportQuery,
        access_token: Option<&str>,
    ) -> Result<ApiResponse<ReportRow>, Error> {
        let data_type = query.common.data_type.unwrap_or_default();
        self.get_reports_raw(query, access_token)
            .await?
            .try_map_data(|row| ReportRow::from_value(data_type, row))
            .map_err(|e| {
                tracing::error!("Failed to decode {} report row: {}", data_type, e);
                Error::ParseFailed(e.to_string())
            })
    }

    /// Fetches a page of the summary report without decoding the rows.
    pub async fn get_summaries_raw(
        &self,
        query: &SummaryQuery,
        access_token: Option<&str>,
    ) -> Result<ApiResponse<serde_json::Value>, Error> {
        self.post("/reports/summaries/", Some(query), &query.to_body(), access_token)
            .await
    }

    /// Fetches a page of the summary report.
    pub async fn get_summaries(
        &self,
        query: &SummaryQuery,
        access_token: Option<&str>,
    ) -> Result<ApiResponse<SummaryRow>, Error> {
        let data_type = query.common.data_type.unwrap_or_default();
        self.get_summaries_raw(query, access_token)
            .await?
            .try_map_data(|row| SummaryRow::from_value(data_type, row))
            .map_err(|e| {
                tracing::error!("Failed to decode {} summary row: {}", data_type, e);
                Error::ParseFailed(e.to_string())
            })
    }
}

fn map_transport_error(e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::RequestFailed
    }
}

/// Pulls `{message, code}` out of an error body, if it is JSON of that shape.
fn structured_error(body: &str) -> (Option<String>, Option<i64>) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => (
            value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            value.get("code").and_then(|c| c.as_i64()),
        ),
        Err(_) => (None, None),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
