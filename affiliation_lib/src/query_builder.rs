//! Maps filter criteria onto the two report query variants.

use affiliation_api::{QueryCommon, ReportQuery, SummaryQuery};

use crate::filter::FilterCriteria;

fn common(criteria: &FilterCriteria) -> QueryCommon {
    QueryCommon {
        code: criteria.code.clone(),
        start_date: criteria.start_date,
        end_date: criteria.end_date,
        data_type: criteria.data_type,
        page: criteria.page,
        page_size: criteria.page_size,
    }
}

/// Detail query: newest records first.
pub fn detail_query(criteria: &FilterCriteria) -> ReportQuery {
    ReportQuery {
        common: common(criteria),
    }
}

/// Summary query: same filters and paging, no ordering.
pub fn summary_query(criteria: &FilterCriteria) -> SummaryQuery {
    SummaryQuery {
        common: common(criteria),
    }
}
