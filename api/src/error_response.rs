use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

pub type Failure = (StatusCode, Json<ErrorResponse>);

pub fn failure(status: StatusCode, error: impl Into<String>) -> Failure {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            error: error.into(),
        }),
    )
}
