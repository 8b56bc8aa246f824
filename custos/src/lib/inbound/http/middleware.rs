use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum::BoxError;
use tower::timeout::error::Elapsed;

use super::handlers::ApiError;
use super::handlers::ApiErrorData;
use crate::domain::access;
use crate::domain::access::AccessError;
use crate::domain::access::Identity;
use crate::domain::user::models::Role;
use crate::inbound::http::router::AppState;

/// Validates the bearer token and adds the caller's [`Identity`] to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| reject(AccessError::InvalidAuthorizationFormat))?
                .to_owned(),
        ),
        None => None,
    };

    let identity = access::authenticate(header.as_deref(), state.auth_service.as_ref())
        .await
        .map_err(reject)?;

    tracing::debug!(
        user_id = %identity.user_id,
        role = %identity.role,
        "Request authenticated"
    );

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Admits the request only if the attached identity carries the expected role.
///
/// Must run after [`authenticate`].
pub async fn require_role(
    State(expected): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    access::require_role(req.extensions().get::<Identity>(), expected).map_err(reject)?;

    Ok(next.run(req).await)
}

fn reject(err: AccessError) -> ApiError {
    tracing::warn!(code = err.code(), error = %err, "Access denied");
    ApiError::from(err)
}

/// Maps failures of the outer service stack onto the error envelope.
pub async fn handle_stack_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        return ApiError::RequestTimeout(ApiErrorData::new(
            "REQUEST_TIMEOUT",
            "Request timed out",
        ));
    }

    ApiError::InternalServerError(err.to_string())
}
