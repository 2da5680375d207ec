//! Widget error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of a widget proxy, answered as `{ "error": ... }`
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

impl WidgetError {
    pub fn status(&self) -> StatusCode {
        match self {
            WidgetError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WidgetError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WidgetError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WidgetError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            WidgetError::Request(_) | WidgetError::Payload(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for WidgetError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Widget request failed: {}", self);
        } else {
            tracing::debug!("Widget request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Turn a non-success upstream response into [`WidgetError::Upstream`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WidgetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(WidgetError::Upstream {
        status: status.as_u16(),
        body,
    })
}
