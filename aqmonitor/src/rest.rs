use crate::errors::Error;
use crate::model::{AirQualityResponse, MostPollutedTime};
use crate::service::AirQualityService;
use axum::{
    extract::{Query, Request, State},
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    service: AirQualityService,
}

#[derive(Debug, Deserialize)]
pub struct NearestCityQuery {
    lat: Option<String>,
    lon: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
    pub error: String,
    pub timestamp: String,
    pub path: String,
}

pub fn create_router(service: AirQualityService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/air-quality/nearest-city", get(get_nearest_city))
        .route("/air-quality/most-polluted-time", get(get_most_polluted_time))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(error_envelope))
}

async fn get_nearest_city(
    State(state): State<AppState>,
    Query(params): Query<NearestCityQuery>,
) -> Result<Json<AirQualityResponse>, ApiError> {
    let lat = parse_decimal("lat", params.lat.as_deref())?;
    let lon = parse_decimal("lon", params.lon.as_deref())?;

    let response = state.service.lookup(lat, lon).await?;
    Ok(Json(response))
}

async fn get_most_polluted_time(
    State(state): State<AppState>,
) -> Result<Json<MostPollutedTime>, ApiError> {
    let worst = state.service.most_polluted_time().await?;
    Ok(Json(worst))
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Cannot {} {}", method, uri.path()))
}

fn parse_decimal(name: &str, raw: Option<&str>) -> Result<f64, ApiError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        ApiError::BadRequest(format!("{} should not be empty", name))
    })?;

    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadRequest(format!("{} must be a decimal number", name)))
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

/// Carried from [`ApiError`] to the envelope middleware.
#[derive(Debug, Clone)]
struct ErrorDetail {
    message: String,
    detail: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorDetail {
                detail: message.clone(),
                message,
            },
            ApiError::Internal(err) => ErrorDetail {
                message: "Internal server error".to_string(),
                detail: format!("{:?}", err),
            },
        };

        let mut response = (
            status,
            Json(serde_json::json!({
                "statusCode": status.as_u16(),
                "message": detail.message,
                "error": reason(status),
            })),
        )
            .into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRequest(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Logs every request and rewrites error responses into [`ErrorEnvelope`].
async fn error_envelope(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        info!("Request to {} {} completed successfully.", method, uri);
        return response;
    }

    let (message, detail) = match response.extensions().get::<ErrorDetail>() {
        Some(d) => (d.message.clone(), d.detail.clone()),
        None => (reason(status).to_string(), reason(status).to_string()),
    };
    error!("Error occurred during request to {} {}: {}", method, uri, detail);

    let envelope = ErrorEnvelope {
        status_code: status.as_u16(),
        message,
        error: reason(status).to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path: uri.to_string(),
    };
    (status, Json(envelope)).into_response()
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Internal Server Error")
}
