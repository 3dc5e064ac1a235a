use std::sync::Arc;

use affiliation_lib::dashboard::{DETAIL_EMPTY_MESSAGE, SUMMARY_EMPTY_MESSAGE};
use affiliation_lib::types::{DataType, ReportRow, SummaryRow};
use affiliation_lib::{
    DashboardConfig, DashboardError, FilterStore, QueryState, RecordingNavigator, ReportDashboard,
    ReportForm, ReportQuery, Services, Session, SummaryQuery, LOGIN_ROUTE,
};
use affiliation_lib::Query;
use chrono::NaiveDate;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn connect(server: &MockServer, navigator: Arc<RecordingNavigator>) -> Services {
    let config = DashboardConfig {
        base_url: server.uri(),
        retry_base_ms: 1,
        ..Default::default()
    };
    config.connect(navigator).unwrap()
}

fn signed_in(services: &Services) {
    services.sessions.restore(Session {
        access_token: "T".to_string(),
        refresh_token: "R".to_string(),
        user_id: "U".to_string(),
        email: None,
    });
}

fn sales_query() -> ReportQuery {
    ReportQuery::default()
        .with_code("AFF-01")
        .with_data_type(DataType::Sales)
}

#[tokio::test]
async fn empty_filter_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let mut dashboard = ReportDashboard::from_query_string(services.reports, "page=1&summary=true");
    dashboard.refresh().await;

    assert!(matches!(dashboard.detail(), QueryState::Idle));
    assert!(matches!(dashboard.summary(), QueryState::Idle));
    assert_eq!(dashboard.empty_state_message(), Some(SUMMARY_EMPTY_MESSAGE));
}

#[tokio::test]
async fn submit_loads_detail_report() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .and(query_param("code", "AFF-01"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-03-31"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("sales_reports.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    signed_in(&services);
    let mut dashboard = ReportDashboard::new(services.reports, FilterStore::from_query_string("page=4"));

    let form = ReportForm {
        input_value: "AFF-01".to_string(),
        from_date: Some(date(2024, 1, 1)),
        to_date: Some(date(2024, 3, 31)),
        summary: false,
        data_type: Some(DataType::Sales),
    };
    dashboard.submit_form(&form, date(2024, 6, 1)).await.unwrap();

    assert_eq!(
        dashboard.filters().query_string(),
        "code=AFF-01&start_date=2024-01-01&end_date=2024-03-31&data_type=SALES"
    );
    let detail = dashboard.detail().data().unwrap();
    assert!(matches!(&detail.data[0], ReportRow::Sales(s) if s.customer_name == "Rahim Uddin"));
    assert_eq!(dashboard.page_info().unwrap().last_page, 5);
    assert_eq!(dashboard.empty_state_message(), None);
}

#[tokio::test]
async fn blank_code_submit_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    signed_in(&services);
    let mut dashboard = ReportDashboard::new(services.reports, FilterStore::new());

    let form = ReportForm {
        input_value: String::new(),
        from_date: None,
        to_date: None,
        summary: false,
        data_type: Some(DataType::Sales),
    };
    let errors = dashboard
        .submit_form(&form, date(2024, 6, 1))
        .await
        .unwrap_err();
    assert_eq!(errors.first_for("input_value"), Some("Input value is required"));
    assert_eq!(dashboard.filters().query_string(), "");
    assert!(matches!(dashboard.detail(), QueryState::Idle));
}

#[tokio::test]
async fn unscoped_urls_make_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    signed_in(&services);
    for qs in [
        "data_type=SALES",
        "code=AFF-01",
        "start_date=2024-01-01&data_type=SALES",
        "code=AFF-01&start_date=2024-06-01&end_date=2023-01-01&summary=true",
    ] {
        let mut dashboard = ReportDashboard::from_query_string(Arc::clone(&services.reports), qs);
        dashboard.refresh().await;
        assert!(matches!(dashboard.detail(), QueryState::Idle), "{}", qs);
        assert!(matches!(dashboard.summary(), QueryState::Idle), "{}", qs);
    }
}

#[tokio::test]
async fn queries_without_data_type_are_not_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    signed_in(&services);
    let err = services
        .reports
        .fetch_detail(&ReportQuery::default().with_code("AFF-01"))
        .await
        .unwrap_err();
    match err {
        DashboardError::Validation(errors) => {
            assert_eq!(errors.first_for("data_type"), Some("Please select a type"))
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    let err = services
        .reports
        .fetch_summary(&SummaryQuery::default().with_code("AFF-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
}

#[tokio::test]
async fn summary_requires_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let mut dashboard =
        ReportDashboard::from_query_string(services.reports, "code=AFF-01&data_type=SALES");
    dashboard.set_summary(true).await;

    assert_eq!(
        dashboard.error().map(|e| e.message.as_str()),
        Some("Authentication required")
    );
    assert_eq!(
        dashboard.filters().query_string(),
        "code=AFF-01&data_type=SALES&summary=true"
    );
}

#[tokio::test]
async fn summary_tab_with_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/summaries/"))
        .and(header("authorization", "Bearer T"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("registration_summaries.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    signed_in(&services);
    let mut dashboard = ReportDashboard::from_query_string(
        services.reports,
        "code=AFF-01&data_type=REGISTRATION&summary=true",
    );
    dashboard.refresh().await;

    let summary = dashboard.summary().data().unwrap();
    assert_eq!(summary.data.len(), 2);
    assert!(matches!(&summary.data[1], SummaryRow::Registration(r) if r.total_users == 7));
    assert!(matches!(dashboard.detail(), QueryState::Idle));
}

#[tokio::test]
async fn invalid_form_keeps_filter_state() {
    let mock_server = MockServer::start().await;
    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let mut dashboard = ReportDashboard::from_query_string(services.reports, "code=OLD");

    let form = ReportForm {
        input_value: "AFF-01".to_string(),
        from_date: Some(date(2024, 1, 1)),
        to_date: Some(date(2024, 5, 1)),
        summary: false,
        data_type: Some(DataType::Sales),
    };
    let errors = dashboard
        .submit_form(&form, date(2024, 6, 1))
        .await
        .unwrap_err();
    assert_eq!(
        errors.first_for("to_date"),
        Some("Date range cannot exceed 3 months")
    );
    assert_eq!(dashboard.filters().query_string(), "code=OLD");
}

#[tokio::test]
async fn concurrent_unauthorized_redirects_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let navigator = Arc::new(RecordingNavigator::new());
    let services = connect(&mock_server, Arc::clone(&navigator));
    signed_in(&services);

    let detail_query = sales_query();
    let summary_query = SummaryQuery::default()
        .with_code("AFF-01")
        .with_data_type(DataType::Sales);
    let (detail, summary) = tokio::join!(
        services.reports.fetch_detail(&detail_query),
        services.reports.fetch_summary(&summary_query),
    );

    assert!(matches!(detail, Err(DashboardError::Authorization)));
    assert!(matches!(summary, Err(DashboardError::Authorization)));
    assert_eq!(navigator.visited(), vec![LOGIN_ROUTE.to_string()]);

    // 401 is never retried.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn unauthorized_shows_on_the_tab() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let navigator = Arc::new(RecordingNavigator::new());
    let services = connect(&mock_server, Arc::clone(&navigator));
    let mut dashboard =
        ReportDashboard::from_query_string(services.reports, "code=AFF-01&data_type=SALES");
    dashboard.refresh().await;

    let error = dashboard.error().unwrap();
    assert_eq!(error.status_code, Some(401));
    assert_eq!(navigator.visited().len(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("sales_reports.json")))
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let resp = services.reports.fetch_detail(&sales_query()).await.unwrap();
    assert_eq!(resp.meta_info.total, 41);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retries_stop_after_two() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let err = services.reports.fetch_detail(&sales_query()).await.unwrap_err();
    match err {
        DashboardError::Server { status, message, .. } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal server error: Please try again later");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Code does not exist",
            "code": 4221,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let mut dashboard = ReportDashboard::from_query_string(services.reports, "code=NOPE&data_type=SALES");
    dashboard.refresh().await;

    let error = dashboard.error().unwrap();
    assert_eq!(error.message, "Code does not exist");
    assert_eq!(error.status_code, Some(4221));
    assert_eq!(error.to_string(), "Error 4221: Code does not exist");
}

#[tokio::test]
async fn responses_are_cached_until_sign_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("sales_reports.json")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let query = sales_query();

    services.reports.fetch_detail(&query).await.unwrap();
    let cached = services.reports.fetch_detail(&query).await.unwrap();
    assert_eq!(cached.data.len(), 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);

    // Another page is another cache entry.
    assert_eq!(
        query.clone().with_page(2).to_query_string(),
        "code=AFF-01&data_type=SALES&page=2&page_size=10&order_by_fields=created_at&ordering=desc"
    );

    services.sessions.sign_out();
    assert!(services.reports.cache().is_empty());
    services.reports.fetch_detail(&query).await.unwrap();
}

#[tokio::test]
async fn empty_result_placeholder() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": [],
        })))
        .mount(&mock_server)
        .await;

    let services = connect(&mock_server, Arc::new(RecordingNavigator::new()));
    let mut dashboard =
        ReportDashboard::from_query_string(services.reports, "code=AFF-01&data_type=SALES");
    dashboard.refresh().await;

    assert_eq!(dashboard.empty_state_message(), Some(DETAIL_EMPTY_MESSAGE));
    let info = dashboard.page_info().unwrap();
    assert_eq!(info.current_page, 1);
    assert_eq!(info.total, 0);
}
