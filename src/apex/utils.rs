use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorMessage {
    pub status: &'static str,
    pub message: String,
}

impl ErrorMessage {
    #[inline]
    pub fn new(_status: StatusCode, message: String) -> Self {
        Self {
            status: "error",
            message,
        }
    }
}

#[derive(Debug)]
pub enum VerboseHTTPError {
    Standard(StatusCode, String),
    /// A collaborator (data store, weather provider) failed mid-request.
    Upstream(String),
}

impl VerboseHTTPError {
    pub fn internal(message: &str) -> Self {
        Self::Standard(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }

    pub fn bad_request(message: &str) -> Self {
        Self::Standard(StatusCode::BAD_REQUEST, message.to_string())
    }
}

impl IntoResponse for VerboseHTTPError {
    fn into_response(self) -> Response {
        match self {
            Self::Standard(status, message) => {
                let error_message = ErrorMessage::new(status, message);
                (status, axum::Json(error_message)).into_response()
            }
            Self::Upstream(message) => {
                let status = StatusCode::BAD_GATEWAY;
                let error_message = ErrorMessage::new(status, message);
                (status, axum::Json(error_message)).into_response()
            }
        }
    }
}
