mod meta;
pub use self::meta::{ApiResponse, MetaInfo};

mod data_type;
pub use self::data_type::DataType;

mod report;
pub use self::report::{RegistrationRecord, ReportRow, SalesRecord};

mod summary;
pub use self::summary::{RegistrationSummary, SalesSummary, SummaryRow};

mod auth;
pub use self::auth::{LoginRequest, LoginTokens};
