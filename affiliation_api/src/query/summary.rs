use url::Url;

use super::common::{Query, QueryCommon};

/// Query for the aggregated report, `POST /reports/summaries/`.
///
/// Same filters and pagination as [`super::ReportQuery`], no ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryQuery {
    pub common: QueryCommon,
}

impl Query for SummaryQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        self.common.add_to_url(url)
    }
    fn to_body(&self) -> serde_json::Value {
        serde_json::Value::Object(self.common.body_fields())
    }
}
