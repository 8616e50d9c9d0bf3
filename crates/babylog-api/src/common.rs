// Shared API error type
//
// Every handler returns ApiError on failure; the body is always
// `{error, kind?, details?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use babylog_core::{InterpretError, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::ServiceError;

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Message safe to show to the end user
    pub error: String,
    /// Machine-readable error kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Internal detail, only for upstream failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// HTTP error: status plus body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                kind: None,
                details: None,
            },
        }
    }

    fn with_kind(mut self, kind: &str) -> Self {
        self.body.kind = Some(kind.to_string());
        self
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<InterpretError> for ApiError {
    fn from(e: InterpretError) -> Self {
        let status = match &e {
            InterpretError::EmptyInput(_) | InterpretError::InvalidRecord(_) => {
                StatusCode::BAD_REQUEST
            }
            InterpretError::NoActivitiesRecognized(_)
            | InterpretError::AmbiguousInstruction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InterpretError::TransportFailure(_)
            | InterpretError::EmptyModelResponse
            | InterpretError::UnparsableResponse(_)
            | InterpretError::SchemaViolation(_) => StatusCode::BAD_GATEWAY,
        };

        let err = ApiError::new(status, e.user_message()).with_kind(e.kind());
        if status == StatusCode::BAD_GATEWAY {
            err.with_details(e.to_string())
        } else {
            err
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(msg) => {
                ApiError::new(StatusCode::BAD_REQUEST, msg).with_kind("invalid_record")
            }
            StoreError::Backend(_) => {
                tracing::error!("Store failure: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable")
                    .with_kind("store_failure")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Interpret(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::NotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "Activity not found").with_kind("not_found")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_error_statuses() {
        let cases = [
            (InterpretError::empty_input("empty"), StatusCode::BAD_REQUEST),
            (
                InterpretError::InvalidRecord("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                InterpretError::NoActivitiesRecognized("nothing".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                InterpretError::AmbiguousInstruction("which?".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (InterpretError::transport("down"), StatusCode::BAD_GATEWAY),
            (InterpretError::EmptyModelResponse, StatusCode::BAD_GATEWAY),
            (InterpretError::unparsable("eof"), StatusCode::BAD_GATEWAY),
            (InterpretError::schema("missing value"), StatusCode::BAD_GATEWAY),
        ];
        for (error, expected) in cases {
            let kind = error.kind();
            let api: ApiError = error.into();
            assert_eq!(api.status, expected, "{kind}");
            assert_eq!(api.body.kind.as_deref(), Some(kind));
        }
    }

    #[test]
    fn test_upstream_errors_carry_details() {
        let api: ApiError = InterpretError::schema("activity 0: missing value").into();
        assert_eq!(api.body.error, "Interpreter returned an invalid activity.");
        assert!(api.body.details.unwrap().contains("missing value"));

        let api: ApiError = InterpretError::NoActivitiesRecognized("Say more".into()).into();
        assert_eq!(api.body.error, "Say more");
        assert!(api.body.details.is_none());
    }

    #[test]
    fn test_store_and_service_errors() {
        let api: ApiError = StoreError::backend("connection refused").into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.body.error.contains("refused"));

        let api: ApiError = ServiceError::NotFound(uuid::Uuid::now_v7()).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
