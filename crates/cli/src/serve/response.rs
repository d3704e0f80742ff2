//! Response envelopes and the error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use fleetflow_engine::{EngineError, ErrorKind};

use super::json_error;

/// `{"success": true, "data": ..., "message": ...}`
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub(crate) fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data, None)
}

pub(crate) fn respond<T: Serialize>(
    status: StatusCode,
    data: T,
    message: Option<&'static str>,
) -> Response {
    let body = Envelope {
        success: true,
        data,
        message,
    };
    (status, Json(body)).into_response()
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub(crate) enum ApiError {
    Engine(EngineError),
    BadRequest(String),
    Forbidden(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Engine(e) => {
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %e, "request failed");
                }
                e.to_string()
            }
            ApiError::BadRequest(m) | ApiError::Forbidden(m) => m,
        };
        json_error(status, &message).into_response()
    }
}
