use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::MetricsError;
use crate::store::StoreError;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts our `HTTPError` into a `{"error": "..."}` JSON response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<MetricsError> for HTTPError {
    fn from(e: MetricsError) -> Self {
        match e {
            MetricsError::Validation(message) => {
                warn!("Rejected request: {}", message);
                HTTPError::new(StatusCode::BAD_REQUEST, message)
            }
            MetricsError::NotFound => HTTPError::new(StatusCode::NOT_FOUND, "Not found"),
            MetricsError::Storage(e) => {
                error!("Store error: {}", e);
                HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<StoreError> for HTTPError {
    fn from(e: StoreError) -> Self {
        MetricsError::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let validation: HTTPError = MetricsError::validation("key cannot be empty").into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.message(), "key cannot be empty");

        let not_found: HTTPError = MetricsError::NotFound.into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict: HTTPError =
            MetricsError::from(StoreError::Conflict("duplicate key".into())).into();
        assert_eq!(conflict.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(conflict.message(), "duplicate key");

        let vanished: HTTPError = MetricsError::from(StoreError::NotFound("x".into())).into();
        assert_eq!(vanished.status(), StatusCode::NOT_FOUND);
    }
}
