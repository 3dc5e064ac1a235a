mod common;
pub use self::common::{Query, QueryCommon, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

mod report;
pub use self::report::{ReportQuery, ORDERING, ORDER_BY_FIELD};

mod summary;
pub use self::summary::SummaryQuery;
