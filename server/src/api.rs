use crate::{
    config::ServerConfig,
    services::donation::{CreateError, DonationService},
    ui,
    wire::{CreateDonationBody, CreateDonationResponse, Donation},
};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::LOCATION, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use donations_status::{invalid_argument, Status};
use log::info;
use serde_json::{json, Value};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

pub const SERVICE_NAME: &str = "DonationsAPI";
pub const CRM_FAILED: &str = "CRM notification failed";

type SharedService = Arc<dyn DonationService>;

/// Routes of the donations API, without middleware.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/donations", get(list_donations).post(create_donation))
        .route("/app", get(ui::index))
        .with_state(service)
}

/// The router wrapped in request logging, CORS and a request timeout.
pub fn app(
    service: SharedService,
    config: &ServerConfig,
) -> Result<Router, axum::http::header::InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.cors.allowed_origin)?)
        .allow_methods(Any)
        .allow_headers(Any);

    let layers = ServiceBuilder::new()
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.http.request_timeout_secs),
        ));

    Ok(router(service).layer(layers))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        start.elapsed()
    );
    response
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "service": SERVICE_NAME }))
}

async fn list_donations(
    State(service): State<SharedService>,
) -> Result<Json<Vec<Donation>>, Status> {
    let rows = service.list_donations().await?;
    Ok(Json(rows.iter().map(Donation::from).collect()))
}

async fn create_donation(
    State(service): State<SharedService>,
    body: Result<Json<CreateDonationBody>, JsonRejection>,
) -> Result<Response, Status> {
    let Json(body) =
        body.map_err(|e| invalid_argument!("invalid request body: {0}", e.body_text()))?;

    let (status, response) = match service.create_donation(body.into()).await {
        Ok(created) => (
            StatusCode::CREATED,
            CreateDonationResponse {
                donation: Donation::from(&created.donation),
                crm_result: Some(created.crm_result),
                crm_error: None,
            },
        ),
        // Stored but not forwarded: still point the caller at the donation.
        Err(CreateError::Notifier { donation, .. }) => (
            StatusCode::ACCEPTED,
            CreateDonationResponse {
                donation: Donation::from(&donation),
                crm_result: None,
                crm_error: Some(CRM_FAILED.to_string()),
            },
        ),
        Err(CreateError::NotStored(e)) => return Err(e.into()),
    };

    let location = format!("/donations/{}", response.donation.id);
    Ok((status, [(LOCATION, location)], Json(response)).into_response())
}
