use agora_core::ForumError;
use agora_types::models::Identity;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::{AppState, SESSION_COOKIE};
use crate::error::{ApiError, blocking};

/// The identity resolved from the `session_id` cookie, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Identity>);

/// Resolve the session cookie on every request and stash the result as a
/// [`CurrentUser`] extension. Unknown or expired tokens resolve to `None`.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        Some(token) if !token.is_empty() => {
            let sessions = state.forum.sessions.clone();
            blocking(move || sessions.resolve(&token)).await?
        }
        _ => None,
    };

    req.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(req).await)
}

/// Reject requests without a live session; otherwise expose the
/// [`Identity`] as an extension.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|user| user.0.clone())
        .ok_or(ForumError::Unauthenticated)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
