//! Database row types. These map directly to SQLite rows.
//! Distinct from agora-types views to keep the DB layer independent.
use chrono::{DateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// A session joined with the username of its owner.
pub struct SessionRow {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
