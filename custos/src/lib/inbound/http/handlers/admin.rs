use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::access::Identity;

pub async fn ping(
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<AdminPingResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        AdminPingResponseData {
            message: "pong".to_string(),
            username: identity.username,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPingResponseData {
    pub message: String,
    pub username: String,
}
