mod render;
mod validation;

use axum::{
    Form, Router,
    extract::{
        Json, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::{
    LoanTerms, MonthlyEntry, Schedule, ScheduleError, annuity_month, compute_schedule,
};

pub use validation::{
    DEBIT_INTEREST, DURATION, FieldError, INITIAL_REPAYMENT, LOAN_AMOUNT, RawTerms,
    RepaymentForm, ValidationErrors, validate_terms,
};

const STYLES_CSS: &str = include_str!("../../web/styles.css");

/// Where the HTTP service listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(host, port),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid repayment parameters: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("Not found")]
    NotFound,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Schedule(ScheduleError::InvalidTerms { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Schedule(ScheduleError::DateOutOfRange(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let field_errors = match self {
            ApiError::Validation(errors) => errors.into_errors(),
            _ => Vec::new(),
        };
        json_response(
            status,
            ErrorResponse {
                error,
                field_errors,
            },
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleResponse<'a> {
    loan_amount_in_cents: i64,
    monthly_annuity_in_cents: i64,
    duration_years: u32,
    entries: &'a [MonthlyEntry],
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(form_page_handler))
        .route(
            render::FORM_PATH,
            get(form_page_handler).post(form_submit_handler),
        )
        .route("/styles.css", get(styles_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn(request_tracing))
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "repayment schedule service listening");
    info!(
        "Local access: http://127.0.0.1:{}{}",
        config.addr.port(),
        render::FORM_PATH
    );

    axum::serve(listener, router()).await
}

async fn form_page_handler() -> Response {
    with_cache_control(Html(render::form_page(&RepaymentForm::default(), None)))
}

async fn form_submit_handler(Form(form): Form<RepaymentForm>) -> Response {
    let terms = match form.validate() {
        Ok(terms) => terms,
        Err(errors) => {
            warn!(fields = errors.len(), "repayment form rejected");
            return with_cache_control(Html(render::form_page(&form, Some(&errors))));
        }
    };

    match compute_schedule(&terms) {
        Ok(schedule) => with_cache_control(Html(render::schedule_page(&terms, &schedule))),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn schedule_get_handler(
    query: Result<Query<RawTerms>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(raw) = query.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    })?;
    schedule_handler_impl(raw)
}

async fn schedule_post_handler(
    payload: Result<Json<RawTerms>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(raw) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid JSON payload: {}", rejection.body_text()))
    })?;
    schedule_handler_impl(raw)
}

fn schedule_handler_impl(raw: RawTerms) -> Result<Response, ApiError> {
    let terms = validate_terms(raw).inspect_err(|errors| {
        warn!(fields = errors.len(), "schedule request rejected");
    })?;
    let schedule = compute_schedule(&terms)?;
    Ok(json_response(
        StatusCode::OK,
        build_schedule_response(&terms, &schedule),
    ))
}

fn build_schedule_response<'a>(terms: &LoanTerms, schedule: &'a Schedule) -> ScheduleResponse<'a> {
    ScheduleResponse {
        loan_amount_in_cents: terms.principal_in_cents(),
        monthly_annuity_in_cents: annuity_month(terms),
        duration_years: schedule.duration_years(),
        entries: schedule.entries(),
    }
}

async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        error!(%method, %path, status = status.as_u16(), duration_ms, "request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = status.as_u16(), duration_ms, "request rejected");
    } else {
        info!(%method, %path, status = status.as_u16(), duration_ms, "request completed");
    }
    response
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
