use crate::response::app_response::{ErrorResponse, ValidationErrorDetail};
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
}

/// JSON body extractor that runs the payload's `Validate` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(RequestError::JsonRejection)?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::ValidationError(validation_errors) => {
                let details = convert_validation_errors_to_details(validation_errors);
                ErrorResponse::with_validation_errors("Validation failed".to_string(), details)
                    .with_status(StatusCode::BAD_REQUEST)
                    .into_response()
            }
            RequestError::JsonRejection(rejection) => ErrorResponse::send(rejection.body_text())
                .with_status(StatusCode::BAD_REQUEST)
                .into_response(),
        }
    }
}

fn convert_validation_errors_to_details(
    errors: validator::ValidationErrors,
) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let params: HashMap<String, Value> = error
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();

                ValidationErrorDetail::new(
                    json_field_name(&field),
                    map_validator_code_to_semantic_type(&error.code, &params),
                    error
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                )
            })
        })
        .collect();

    // HashMap order is unstable; keep the response deterministic
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// Request bodies are camelCase; validator reports the Rust field name.
fn json_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;

    for c in field.chars() {
        if c == '_' {
            upper_next = !name.is_empty();
        } else if upper_next {
            name.extend(c.to_uppercase());
            upper_next = false;
        } else {
            name.push(c);
        }
    }

    name
}

fn map_validator_code_to_semantic_type(code: &str, params: &HashMap<String, Value>) -> String {
    match code {
        "email" => "INVALID_FORMAT".to_string(),
        "must_match" => "MISMATCH".to_string(),
        "length" => {
            let min = params.get("min").and_then(|v| v.as_i64());
            let has_max = params.contains_key("max");
            let value_len = params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as i64);

            match (min, value_len) {
                (Some(_), Some(0)) => "MISSING".to_string(),
                (Some(min), Some(len)) if len < min => "TOO_SHORT".to_string(),
                _ if has_max => "INVALID_LENGTH".to_string(),
                _ => "TOO_SHORT".to_string(),
            }
        }
        "required" => "MISSING".to_string(),
        _ => "INVALID_VALUE".to_string(),
    }
}
