//! Error taxonomy for the account endpoints and its HTTP mapping.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use super::repo::RepoError;

/// Shared by unknown-user and wrong-password so the two are indistinguishable.
pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::UsernameTaken => {
                ApiError::validation("username", "A user with that username already exists.")
            }
            RepoError::Other(e) => ApiError::Internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorBody {
    fn detail(detail: impl Into<String>) -> Json<Self> {
        Json(Self {
            detail: detail.into(),
            field: None,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    detail: message,
                    field: Some(field),
                }),
            )
                .into_response(),
            ApiError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, ErrorBody::detail(INVALID_CREDENTIALS)).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::detail(msg)).into_response()
            }
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
                ErrorBody::detail(msg),
            )
                .into_response(),
            ApiError::MethodNotAllowed(method) => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, HeaderValue::from_static("GET"))],
                ErrorBody::detail(format!("Method \"{method}\" not allowed.")),
            )
                .into_response(),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::detail("Internal server error"),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::validation("password", "short"), StatusCode::BAD_REQUEST),
            (ApiError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (ApiError::BadRequest("eof".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (ApiError::MethodNotAllowed(Method::PUT), StatusCode::METHOD_NOT_ALLOWED),
            (ApiError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn unauthorized_carries_challenge_header() {
        let res = ApiError::Unauthorized("missing").into_response();
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn method_not_allowed_advertises_get() {
        let res = ApiError::MethodNotAllowed(Method::PATCH).into_response();
        assert_eq!(res.headers()[header::ALLOW], "GET");
    }

    #[test]
    fn username_taken_maps_to_validation() {
        let err: ApiError = RepoError::UsernameTaken.into();
        assert!(matches!(err, ApiError::Validation { field: "username", .. }));
    }
}
