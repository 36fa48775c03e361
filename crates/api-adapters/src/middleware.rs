//! Request middleware: the staff gate and request metrics.

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use domains::{Actor, DomainError};
use services::{check_staff, Access, Denial};

use crate::error::ApiError;
use crate::state::AppState;

/// Username carried by the bearer token, if any. A header that is present
/// but unusable is an error rather than an anonymous request.
pub fn bearer_identity(state: &AppState, headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DomainError::Unauthorized("expected 'Authorization: Bearer <token>'".into()))?;
    Ok(Some(state.tokens.verify(token)?))
}

fn denial_reason(denial: Denial) -> &'static str {
    match denial {
        Denial::Anonymous => "anonymous",
        Denial::UnknownUser => "unknown_user",
        Denial::NotStaff => "not_staff",
    }
}

/// Lets a request through only when the acting user exists and is staff.
/// The permitted user is attached to the request as an [`Actor`].
pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let acting = bearer_identity(&state, request.headers())?;

    match check_staff(state.users.as_ref(), acting.as_deref()).await? {
        Access::Permitted(user) => {
            request.extensions_mut().insert(Actor::user(&user));
            Ok(next.run(request).await)
        }
        Access::Denied(denial) => {
            let reason = denial_reason(denial);
            state.metrics.record_denial(reason);
            tracing::info!(user = acting.as_deref().unwrap_or("-"), reason, "access denied");
            Err(DomainError::Forbidden("staff access required".into()).into())
        }
    }
}

/// Counts every response by method, matched route, and status.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    state.metrics.record_request(&method, &route, response.status().as_u16());
    response
}
