use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use brandsite_core::{AdminError, ErrorKind};
use serde_json::json;
use std::fmt;

// Maps core errors onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub AdminError);

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        ApiError(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.0.to_string(),
        }))
    }
}
