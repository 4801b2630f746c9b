use crate::response::app_response::ErrorResponse;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

pub async fn not_found(uri: Uri) -> Response {
    ErrorResponse::send(format!("No route for {}", uri.path()))
        .with_status(StatusCode::NOT_FOUND)
        .into_response()
}
