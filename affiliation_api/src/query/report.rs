use url::Url;

use super::common::{Query, QueryCommon};

/// Detail rows are always listed newest first.
pub const ORDER_BY_FIELD: &str = "created_at";
pub const ORDERING: &str = "desc";

/// Query for the detailed (per-record) report, `POST /reports/`.
///
/// The ordering is fixed and always sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub common: QueryCommon,
}

impl Query for ReportQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        url.query_pairs_mut()
            .append_pair("order_by_fields", ORDER_BY_FIELD)
            .append_pair("ordering", ORDERING);
        url
    }
    fn to_body(&self) -> serde_json::Value {
        let mut body = self.common.body_fields();
        body.insert("order_by_fields".into(), ORDER_BY_FIELD.into());
        body.insert("ordering".into(), ORDERING.into());
        serde_json::Value::Object(body)
    }
}
