use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::access::Identity;

/// Identity the guard resolved from the caller's token.
pub async fn me(
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<Identity>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, identity))
}
