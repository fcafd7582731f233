use serde_json::json;

use crate::engine::primitives::PrimitiveError;

/// Failure of a single engine call. The call never leaves a partial UUID, a
/// partial arena write or a half-filled scope slot behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid namespace '{0}': neither a well-known name nor a UUID string")]
    InvalidNamespace(String),
    #[error("missing argument: {0} must not be empty")]
    MissingArgument(&'static str),
    #[error("primitive failure: {0}")]
    PrimitiveFailure(#[from] PrimitiveError),
    #[error("insufficient workspace: need {required} bytes, {available} free")]
    InsufficientCapacity { required: usize, available: usize },
}

/// Stable, distinguishable reason codes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidNamespace,
    MissingArgument,
    PrimitiveFailure,
    InsufficientCapacity,
    InvalidRequest,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidNamespace => "invalid_namespace",
            ErrorCode::MissingArgument => "missing_argument",
            ErrorCode::PrimitiveFailure => "primitive_failure",
            ErrorCode::InsufficientCapacity => "insufficient_capacity",
            ErrorCode::InvalidRequest => "invalid_request",
        }
    }
}

impl EngineError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidNamespace(_) => ErrorCode::InvalidNamespace,
            EngineError::MissingArgument(_) => ErrorCode::MissingArgument,
            EngineError::PrimitiveFailure(_) => ErrorCode::PrimitiveFailure,
            EngineError::InsufficientCapacity { .. } => ErrorCode::InsufficientCapacity,
        }
    }
}

/// Error surfaced by the HTTP host around the engine.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Broad error category for status code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    ServerError,
}

impl ServiceError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ServiceError::Engine(err) => err.code(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        category_for_code(self.code())
    }
}

#[must_use]
pub fn category_for_code(code: ErrorCode) -> ErrorCategory {
    match code {
        ErrorCode::InvalidNamespace | ErrorCode::MissingArgument | ErrorCode::InvalidRequest => {
            ErrorCategory::InvalidRequest
        }
        ErrorCode::PrimitiveFailure | ErrorCode::InsufficientCapacity => {
            ErrorCategory::ServerError
        }
    }
}

// ---------------------------------------------------------------------------
// Category -> HTTP status code
// ---------------------------------------------------------------------------

fn http_status_for_category(cat: ErrorCategory) -> http::StatusCode {
    match cat {
        ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
        ErrorCategory::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error object shared by single and batch responses.
#[must_use]
pub fn error_payload(code: ErrorCode, message: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": code.as_str(),
            "message": message,
        }
    })
}

/// Format an error, returning (`status_code`, JSON body).
#[must_use]
pub fn format_error(err: &ServiceError) -> (http::StatusCode, serde_json::Value) {
    let code = err.code();
    let status = http_status_for_category(category_for_code(code));
    (status, error_payload(code, &err.to_string()))
}

// ---------------------------------------------------------------------------
// Axum integration
// ---------------------------------------------------------------------------

impl axum::response::IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = format_error(&self);
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_distinct() {
        let codes = [
            ErrorCode::InvalidNamespace,
            ErrorCode::MissingArgument,
            ErrorCode::PrimitiveFailure,
            ErrorCode::InsufficientCapacity,
            ErrorCode::InvalidRequest,
        ];
        let mut names: Vec<&str> = codes.iter().map(|code| code.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), codes.len());
    }

    #[test]
    fn caller_errors_map_to_bad_request() {
        let err = ServiceError::from(EngineError::InvalidNamespace("nope".to_string()));
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_namespace");
    }

    #[test]
    fn primitive_failure_keeps_primitive_code() {
        let err = EngineError::from(PrimitiveError {
            primitive: "os-random",
            code: 7,
            message: "entropy unavailable".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::PrimitiveFailure);
        assert!(err.to_string().contains("code 7"));
        let (status, _) = format_error(&ServiceError::from(err));
        assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
