mod client;
mod errors;
mod query;
pub mod types;
pub use self::client::{Client, DEFAULT_BASE_URL, REQUEST_TIMEOUT};
pub use self::errors::Error;
pub use self::query::{
    Query, QueryCommon, ReportQuery, SummaryQuery, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, ORDERING,
    ORDER_BY_FIELD,
};
