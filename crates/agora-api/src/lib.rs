pub mod auth;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod reactions;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::{require_auth, resolve_session};

/// All board routes. Every request passes through session resolution;
/// authoring routes additionally require a live session.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/categories", get(posts::list_categories))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/reactions", post(reactions::toggle_reaction));

    let protected_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}/comments", post(posts::add_comment))
        .layer(axum_middleware::from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), resolve_session))
        .with_state(state)
}
