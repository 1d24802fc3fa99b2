use serde::{Deserialize, Serialize};

use crate::models::{Identity, PostView};
use crate::reactions::ReactionState;
use crate::CategoryId;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// -- Posts --

/// Query string of the post listing: `?q=..&category=1&category=3&liked=1`.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: Vec<CategoryId>,
    pub liked: Option<String>,
}

impl ListPostsQuery {
    pub fn liked_only(&self) -> bool {
        matches!(self.liked.as_deref(), Some("1" | "true" | "on"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub user: Option<Identity>,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

// -- Reactions --

/// Raw reaction form. Every field stays as text here so that missing or
/// malformed values reach the core's validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToggleReactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub state: ReactionState,
    pub likes: u64,
    pub dislikes: u64,
}
