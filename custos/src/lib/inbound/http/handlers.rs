use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::access::AccessError;
use crate::user::errors::AuthError;

pub mod admin;
pub mod health;
pub mod login;
pub mod me;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Transport error. Variants pick the status code; the payload is the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(ApiErrorData),
    Unauthorized(ApiErrorData),
    Forbidden(ApiErrorData),
    Conflict(ApiErrorData),
    RequestTimeout(ApiErrorData),
    /// Detail is logged, never returned.
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, data) = match self {
            ApiError::BadRequest(data) => (StatusCode::BAD_REQUEST, data),
            ApiError::Unauthorized(data) => (StatusCode::UNAUTHORIZED, data),
            ApiError::Forbidden(data) => (StatusCode::FORBIDDEN, data),
            ApiError::Conflict(data) => (StatusCode::CONFLICT, data),
            ApiError::RequestTimeout(data) => (StatusCode::REQUEST_TIMEOUT, data),
            ApiError::InternalServerError(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorData::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        };

        (status, Json(ApiResponseBody::new(status, data))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let data = ApiErrorData {
            code: err.code().to_string(),
            message: err.public_message(),
            fields: err.fields(),
        };

        match err {
            AuthError::InvalidInput { .. } => ApiError::BadRequest(data),
            AuthError::UserAlreadyExists { .. } => ApiError::Conflict(data),
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::TokenInvalid => {
                ApiError::Unauthorized(data)
            }
            AuthError::Internal(detail) => ApiError::InternalServerError(detail),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        if let AccessError::Token(AuthError::Internal(detail)) = err {
            return ApiError::InternalServerError(detail);
        }

        let data = ApiErrorData::new(err.code(), err.public_message());
        if err.is_forbidden() {
            ApiError::Forbidden(data)
        } else {
            ApiError::Unauthorized(data)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(ApiErrorData::new("INVALID_REQUEST", rejection.body_text()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ApiErrorData {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: None,
        }
    }
}
