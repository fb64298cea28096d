use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::proxy::path_guard::PathRejection;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid download path: {0}")]
    InvalidPath(#[from] PathRejection),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(std::time::Duration),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_request_error",
            Self::Upstream(_) | Self::UpstreamTimeout(_) => "upstream_error",
            Self::Response(_) => "api_error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "error": {
                    "type": self.kind(),
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}
