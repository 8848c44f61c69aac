use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{TimeZone, Utc};
use donations_server::{
    api,
    config::ServerConfig,
    crm::{self, stub::StubCrmClient, Acknowledgment, CrmClient},
    services::donation::DonationServiceImpl,
};
use donations_storage::models::donation::DonationRow;
use donations_storage_mocks::*;
use mockall::mock;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mock! {
    pub Crm {}

    #[async_trait]
    impl CrmClient for Crm {
        async fn send_donation(&self, donation: &DonationRow) -> Result<Acknowledgment, crm::Error>;
    }
}

fn router(database: MockDatabaseClient, crm: Arc<dyn CrmClient>) -> Router {
    let service = DonationServiceImpl::<MockDatabaseClient, MockStore, MockStore>::new(
        Arc::new(database),
        crm,
    );
    api::router(Arc::new(service))
}

// A database whose single transaction inserts with `id` and commits.
fn database_inserting(id: i64) -> MockDatabaseClient {
    let mut database = MockDatabaseClient::new();
    let mut txn = MockStore::new();
    txn.expect_add_donation().times(1).return_once(move |new_row| {
        Ok(DonationRow {
            id,
            donor_name: new_row.donor_name,
            amount: new_row.amount,
            date: new_row.date,
        })
    });
    txn.expect_commit().times(1).return_once(|| Ok(()));
    database.expect_begin().times(1).return_once(|| Ok(txn));
    database
}

fn database_listing(rows: Vec<DonationRow>) -> MockDatabaseClient {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).return_once(move || {
        let mut store = MockStore::new();
        store
            .expect_list_donations()
            .times(1)
            .return_once(move || Ok(rows));
        store
    });
    database
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/donations")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_probe() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(get("/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "ok": true, "service": "DonationsAPI" })
    );
}

#[tokio::test]
async fn list_empty_store() {
    let response = router(database_listing(vec![]), Arc::new(StubCrmClient::new()))
        .oneshot(get("/donations"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn list_donations_as_json() {
    let rows = vec![
        DonationRow {
            id: 2,
            donor_name: "Bob".to_string(),
            amount: Decimal::new(1050, 2),
            date: Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap(),
        },
        DonationRow {
            id: 1,
            donor_name: "Jane Doe".to_string(),
            amount: Decimal::new(5000, 2),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        },
    ];

    let response = router(database_listing(rows), Arc::new(StubCrmClient::new()))
        .oneshot(get("/donations"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([
            { "id": 2, "donorName": "Bob", "amount": 10.5, "date": "2024-02-01T09:30:00Z" },
            { "id": 1, "donorName": "Jane Doe", "amount": 50.0, "date": "2024-01-15T10:00:00Z" },
        ])
    );
}

#[tokio::test]
async fn create_donation() {
    let response = router(database_inserting(1), Arc::new(StubCrmClient::new()))
        .oneshot(post_json(
            r#"{"donorName": "Jane Doe", "amount": 50.00, "date": "2024-01-15T10:00:00Z"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], "/donations/1");

    let body = json_body(response).await;
    assert_eq!(
        body["donation"],
        json!({ "id": 1, "donorName": "Jane Doe", "amount": 50.0, "date": "2024-01-15T10:00:00Z" })
    );
    assert_eq!(body["crmResult"]["status"], "ok");
    assert_eq!(body["crmResult"]["provider"], "MockCRM");
    assert_eq!(body["crmResult"]["echo"], body["donation"]);
    assert!(body.get("crmError").is_none());
}

#[tokio::test]
async fn create_donation_without_date() {
    let before = Utc::now();
    let response = router(database_inserting(2), Arc::new(StubCrmClient::new()))
        .oneshot(post_json(r#"{"donorName": " Bob ", "amount": 10}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["donation"]["donorName"], "Bob");

    let date = body["donation"]["date"]
        .as_str()
        .unwrap()
        .parse::<chrono::DateTime<Utc>>()
        .unwrap();
    assert!(date >= before - chrono::Duration::seconds(1));
    assert!(date <= Utc::now());
}

#[tokio::test]
async fn empty_donor_name_is_bad_request() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(post_json(r#"{"donorName": "", "amount": 10}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "DonorName is required" })
    );
}

#[tokio::test]
async fn negative_amount_is_bad_request() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": -5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Amount must be > 0" })
    );
}

#[tokio::test]
async fn missing_fields_are_bad_request() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(post_json("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "DonorName is required" })
    );
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": "#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn crm_failure_is_accepted_with_warning() {
    let mut crm = MockCrm::new();
    crm.expect_send_donation().times(1).returning(|_| {
        Err(crm::Error::Rejected {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "maintenance".to_string(),
        })
    });

    let response = router(database_inserting(3), Arc::new(crm))
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": 5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()[header::LOCATION], "/donations/3");

    let body = json_body(response).await;
    assert_eq!(body["donation"]["id"], 3);
    assert_eq!(body["crmResult"], Value::Null);
    assert_eq!(body["crmError"], "CRM notification failed");
}

#[tokio::test]
async fn storage_failure_hides_details() {
    let mut database = MockDatabaseClient::new();
    database.expect_begin().times(1).return_once(|| {
        Err(anyhow::anyhow!("password authentication failed for postgres://secret").into())
    });

    let response = router(database, Arc::new(MockCrm::new()))
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": 5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "internal error" }));
}

#[tokio::test]
async fn app_page_is_served() {
    let response = router(MockDatabaseClient::new(), Arc::new(StubCrmClient::new()))
        .oneshot(get("/app"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<h1>Donations</h1>"));
    assert!(html.contains("fetch(\"/donations\""));
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let config = ServerConfig::parse(
        r#"
        port = 5000

        [postgres]
        uri = "postgres://localhost/donations"

        [cors]
        allowed-origin = "http://localhost:3000"
        "#,
    )
    .unwrap();
    let service = DonationServiceImpl::<MockDatabaseClient, MockStore, MockStore>::new(
        Arc::new(MockDatabaseClient::new()),
        Arc::new(StubCrmClient::new()),
    );
    let app = api::app(Arc::new(service), &config).unwrap();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/donations")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(preflight).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

struct SlowCrm;

#[async_trait]
impl CrmClient for SlowCrm {
    async fn send_donation(&self, _donation: &DonationRow) -> Result<Acknowledgment, crm::Error> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(json!({ "status": "ok" }))
    }
}

#[tokio::test]
async fn slow_request_times_out() {
    let config = ServerConfig::parse(
        r#"
        port = 5000

        [postgres]
        uri = "postgres://localhost/donations"

        [http]
        request-timeout-secs = 1
        "#,
    )
    .unwrap();
    let service = DonationServiceImpl::<MockDatabaseClient, MockStore, MockStore>::new(
        Arc::new(database_inserting(4)),
        Arc::new(SlowCrm),
    );
    let app = api::app(Arc::new(service), &config).unwrap();

    let response = app
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": 10}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn string_amount_is_rejected() {
    // No expectations: the body never reaches the service.
    let response = router(MockDatabaseClient::new(), Arc::new(MockCrm::new()))
        .oneshot(post_json(r#"{"donorName": "Bob", "amount": "10"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid request body"));
}
