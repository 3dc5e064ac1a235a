use serde::{Deserialize, Serialize};

/// Pagination block returned with every list response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetaInfo {
    pub total: i64,
    pub current_page: i64,
    pub last_page: i64,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

impl Default for MetaInfo {
    fn default() -> Self {
        Self {
            total: 0,
            current_page: 1,
            last_page: 1,
            next_page: None,
            prev_page: None,
            extra: None,
        }
    }
}

/// Envelope used by every report endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Vec<T>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub meta_info: MetaInfo,
}

impl<T> ApiResponse<T> {
    /// Converts every row, keeping the envelope. Fails on the first row that
    /// does not convert.
    pub fn try_map_data<U, E, F>(self, f: F) -> Result<ApiResponse<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(ApiResponse {
            success: self.success,
            data,
            message: self.message,
            code: self.code,
            meta_info: self.meta_info,
        })
    }
}
