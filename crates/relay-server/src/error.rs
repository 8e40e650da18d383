use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::RelayError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// 请求体不是合法的告警 JSON
    Decode(String),
    Relay(RelayError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Relay(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Relay(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Decode(msg) => msg,
            ApiError::Relay(e) => e.to_string(),
        };

        let body = Json(json!({
            "status": "error",
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError::Relay(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
