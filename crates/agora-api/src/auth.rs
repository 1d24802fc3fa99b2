use std::sync::Arc;

use agora_core::Forum;
use agora_types::api::{LoginRequest, RegisterRequest};
use agora_types::models::Session;
use axum::{
    Form,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{ApiError, blocking};

pub const SESSION_COOKIE: &str = "session_id";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub forum: Forum,
}

// -- Cookie helpers --

fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn session_cookie(session: &Session) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Expires={}",
        SESSION_COOKIE,
        session.token,
        http_date(session.expires_at)
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; Expires={}",
        SESSION_COOKIE,
        http_date(DateTime::UNIX_EPOCH)
    )
}

// -- Handlers --

/// POST /register: create the account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Form(req): Form<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.forum.credentials.clone();
    let (_, session) =
        blocking(move || credentials.register(&req.email, &req.username, &req.password)).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
        Redirect::to("/"),
    ))
}

/// POST /login: replaces any session the user already had.
pub async fn login(
    State(state): State<AppState>,
    Form(req): Form<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.forum.credentials.clone();
    let (_, session) = blocking(move || credentials.authenticate(&req.email, &req.password)).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
        Redirect::to("/"),
    ))
}

/// POST /logout: always succeeds from the caller's point of view.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        let sessions = state.forum.sessions.clone();
        if let Err(e) = blocking(move || sessions.invalidate(&token)).await {
            warn!("Logout could not invalidate session: {}", e);
        }
    }

    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
}
