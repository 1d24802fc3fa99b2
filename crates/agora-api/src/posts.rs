use agora_core::ForumError;
use agora_types::api::{CreateCommentRequest, CreatePostRequest, ListPostsQuery, PostListResponse};
use agora_types::models::Identity;
use agora_types::PostId;
use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::{Form as MultiForm, Query};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;

/// GET /: `?q=text&category=1&category=2&liked=1`
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let liked_by = if query.liked_only() {
        Some(user.as_ref().ok_or(ForumError::Unauthenticated)?.user_id)
    } else {
        None
    };

    let posts_query = state.forum.query.clone();
    let posts =
        blocking(move || posts_query.list_posts(&query.q, &query.category, liked_by)).await?;

    Ok(Json(PostListResponse { user, posts }))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let query = state.forum.query.clone();
    let categories = blocking(move || query.list_categories()).await?;
    Ok(Json(categories))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let query = state.forum.query.clone();
    let detail = blocking(move || query.get_post(post_id)).await?;
    Ok(Json(detail))
}

/// POST /posts: repeated `categories` fields select the categories.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    MultiForm(req): MultiForm<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let authoring = state.forum.authoring.clone();
    let post_id = blocking(move || {
        authoring.create_post(&identity, &req.title, &req.content, &req.categories)
    })
    .await?;

    Ok(Redirect::to(&format!("/posts/{}", post_id)))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(post_id): Path<PostId>,
    Form(req): Form<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let authoring = state.forum.authoring.clone();
    blocking(move || authoring.add_comment(&identity, post_id, &req.content)).await?;

    Ok(Redirect::to(&format!("/posts/{}", post_id)))
}
