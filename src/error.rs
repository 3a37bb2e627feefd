use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::http::ApiResponse;

/// The main error type for orgauth handlers and services.
///
/// Every variant maps to exactly one HTTP status and one stable `error` code
/// in the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum OrgAuthError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrgAuthError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials("invalid username or password".to_string())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-stable error code placed in the envelope's `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }

    /// Human-readable message for the envelope's `message` field.
    ///
    /// Internal failures are reported generically; the detail stays in the
    /// server log under the error id.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::InvalidCredentials(msg) | Self::Unauthorized(msg) => {
                msg.clone()
            }
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for OrgAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            let error_id = uuid::Uuid::new_v4();
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ApiResponse::<()>::failure(self.public_message(), self.code());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for orgauth operations
pub type Result<T> = std::result::Result<T, OrgAuthError>;

impl From<axum::extract::rejection::JsonRejection> for OrgAuthError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        OrgAuthError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            OrgAuthError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OrgAuthError::invalid_credentials().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            OrgAuthError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            OrgAuthError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            OrgAuthError::bad_request("x").code(),
            OrgAuthError::invalid_credentials().code(),
            OrgAuthError::unauthorized("x").code(),
            OrgAuthError::internal("x").code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_exposed() {
        let response =
            OrgAuthError::internal("connection refused to 10.0.0.3:5432").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "internal server error");
        assert_eq!(body["error"], "internal");
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = OrgAuthError::unauthorized("not authorized").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "not authorized");
        assert_eq!(body["error"], "unauthorized");
        assert!(body.get("data").is_none());
    }
}
