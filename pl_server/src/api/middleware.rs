//! Authentication middleware for protected endpoints.
//!
//! Extracts the bearer token from the `Authorization` header, verifies it
//! and injects an [`AuthenticatedUser`] into request extensions.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use pl_server::api::auth::AuthenticatedUser;
//!
//! async fn protected_handler(Extension(user): Extension<AuthenticatedUser>) -> String {
//!     format!("Authenticated as user {}", user.user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use poker_ledger::GameError;

use super::{AppState, auth::AuthenticatedUser, errors::ApiError};
use crate::logging::log_security_event;

/// Authentication middleware that validates bearer tokens
///
/// - **Success**: injects `AuthenticatedUser` and calls the next handler
/// - **Missing header / invalid format / invalid or expired token**: `401`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(GameError::Unauthenticated))?;

    match state.token_verifier.verify(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(claims));
            Ok(next.run(request).await)
        }
        Err(e) => {
            log_security_event(
                "invalid_token",
                None,
                Some(request.uri().path()),
                &e.to_string(),
            );
            Err(ApiError(GameError::Unauthenticated))
        }
    }
}
