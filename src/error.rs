use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::users::validate::ValidationError;

/// Body written for every non-2xx user response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

/// Failure kinds surfaced at the handler boundary. Lower layers hand back
/// `ValidationError` or `anyhow::Error`; the conversion into this type is the
/// only place a status code is chosen.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing parameters: {}", .0.join(", "))]
    MissingParameter(Vec<&'static str>),
    #[error("invalid id: {0:?}")]
    InvalidId(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Downstream(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingParameter(_) => "Bad Request - Missing Params".into(),
            ApiError::InvalidId(_) => "Bad Request - Invalid ID".into(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Downstream(_) => "Internal Server Error".into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MissingParameter(keys) => ApiError::MissingParameter(keys),
            ValidationError::InvalidId(raw) => ApiError::InvalidId(raw),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        // downcast_ref sees through any .context() layers
        match e.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::RowNotFound) => ApiError::NotFound(sqlx::Error::RowNotFound.to_string()),
            _ => ApiError::Downstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::MissingParameter(_) | ApiError::InvalidId(_) => {
                warn!(%status, error = %self, "rejected request")
            }
            ApiError::NotFound(_) => info!(%status, error = %self, "no rows"),
            ApiError::Downstream(e) => error!(%status, error = ?e, "downstream failure"),
        }
        let body = ErrorBody {
            status: status.as_u16(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
