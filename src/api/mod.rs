use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::{
    AccountSnapshot, Config, ConfigError, DebtSnapshot, ProjectionResult, Snapshot, SweepError,
    SweepParameter, SweepRequest, SweepResult, run_projection, run_sensitivity_sweep,
    validate_config, validate_snapshot, validate_start_date,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("Invalid parameter: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Invalid sweep: {0}")]
    Sweep(#[from] SweepError),

    #[error("Not found")]
    NotFound,

    #[error("Projection worker failed: {0}")]
    Worker(String),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Validation {
            field: err.field(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::Validation { .. } | ApiError::Sweep(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            if status != StatusCode::NOT_FOUND {
                warn!(error = %self, "rejected request");
            }
            self.to_string()
        };
        error_response(status, &message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Request body for a single projection. The snapshot travels in the body;
/// `start_date` defaults to today.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculatePayload {
    config: Config,
    accounts: Vec<AccountSnapshot>,
    debts: Vec<DebtSnapshot>,
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SweepPayload {
    #[serde(flatten)]
    inputs: CalculatePayload,
    parameter: SweepParameter,
    #[serde(default)]
    values: Vec<f64>,
}

/// Validated inputs ready to hand to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInputs {
    pub config: Config,
    pub snapshot: Snapshot,
    pub start: NaiveDate,
}

/// Validates config and snapshot and resolves the start date. Shared by the
/// HTTP handlers and the CLI so both reject the same inputs.
pub fn prepare_projection(
    config: Config,
    snapshot: Snapshot,
    start_date: Option<NaiveDate>,
) -> Result<ProjectionInputs, ConfigError> {
    validate_config(&config)?;
    validate_snapshot(&snapshot)?;
    let start = start_date.unwrap_or_else(|| Local::now().date_naive());
    validate_start_date(&config, start)?;
    Ok(ProjectionInputs {
        config,
        snapshot,
        start,
    })
}

impl CalculatePayload {
    fn into_inputs(self) -> Result<ProjectionInputs, ConfigError> {
        let snapshot = Snapshot {
            accounts: self.accounts,
            debts: self.debts,
        };
        prepare_projection(self.config, snapshot, self.start_date)
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/projections/calculate", post(calculate_handler))
        .route("/api/projections/sweep", post(sweep_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "forecast HTTP API listening");
    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn calculate_handler(payload: Result<Json<CalculatePayload>, JsonRejection>) -> Response {
    match calculate(payload).await {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => err.into_response(),
    }
}

async fn sweep_handler(payload: Result<Json<SweepPayload>, JsonRejection>) -> Response {
    match sweep(payload).await {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => err.into_response(),
    }
}

async fn calculate(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> ApiResult<ProjectionResult> {
    let Json(payload) = payload?;
    let inputs = payload.into_inputs()?;

    let result = tokio::task::spawn_blocking(move || {
        run_projection(&inputs.config, &inputs.snapshot, inputs.start)
    })
    .await
    .map_err(|e| ApiError::Worker(e.to_string()))?;

    info!(
        months = result.months(),
        final_net_worth = result.net_worth.last().map_or(0.0, |p| p.value),
        "projection calculated"
    );
    Ok(result)
}

async fn sweep(payload: Result<Json<SweepPayload>, JsonRejection>) -> ApiResult<SweepResult> {
    let Json(payload) = payload?;
    let request = SweepRequest {
        parameter: payload.parameter,
        values: payload.values,
    };
    let inputs = payload.inputs.into_inputs()?;

    let result = tokio::task::spawn_blocking(move || {
        run_sensitivity_sweep(&inputs.config, &inputs.snapshot, inputs.start, &request)
    })
    .await
    .map_err(|e| ApiError::Worker(e.to_string()))??;

    info!(
        parameter = ?result.parameter,
        points = result.points.len(),
        "sensitivity sweep calculated"
    );
    Ok(result)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
