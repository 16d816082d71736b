//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use matching_core::{PortError, User};
use std::sync::Arc;
use tracing::warn;

use crate::web::{rest::error_response, state::AppState};

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts a bearer token from `Authorization`, falling back to a
/// `session=<token>` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
}

/// Middleware that resolves the caller's token to a user.
///
/// If valid, inserts a [`CurrentUser`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return error_response(PortError::Unauthorized).into_response();
    };

    let user = match state.identity.authenticate(token).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Rejected request with invalid credentials: {e}");
            return error_response(e).into_response();
        }
    };

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}
