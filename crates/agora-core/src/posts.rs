use std::sync::Arc;

use agora_db::Database;
use agora_types::models::Identity;
use agora_types::{CategoryId, CommentId, PostId};
use tracing::info;

use crate::clock::Clock;
use crate::error::{FieldErrors, ForumError};

const TITLE_MAX: usize = 200;
const CONTENT_MAX: usize = 5000;
const COMMENT_MAX: usize = 2000;

/// Write side of the board: new posts and comments.
#[derive(Clone)]
pub struct PostAuthoring {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl PostAuthoring {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn create_post(
        &self,
        author: &Identity,
        title: &str,
        content: &str,
        category_ids: &[CategoryId],
    ) -> Result<PostId, ForumError> {
        let title = title.trim();
        let content = content.trim();

        let mut errors = FieldErrors::new();
        if title.is_empty() || title.chars().count() > TITLE_MAX {
            errors.add("title", "Title is required (up to 200 characters)");
        }
        if content.is_empty() || content.chars().count() > CONTENT_MAX {
            errors.add("content", "Content is required (up to 5000 characters)");
        }
        if category_ids.is_empty() {
            errors.add("categories", "Pick at least one category");
        }
        errors.into_result()?;

        let post_id = self
            .db
            .create_post(author.user_id, title, content, category_ids, self.clock.now())
            .map_err(ForumError::transaction)?
            .ok_or_else(|| {
                let mut errors = FieldErrors::new();
                errors.add("categories", "Unknown category");
                ForumError::Validation(errors)
            })?;

        info!("Post {} created by {}", post_id, author.username);
        Ok(post_id)
    }

    pub fn add_comment(&self, author: &Identity, post_id: PostId, content: &str) -> Result<CommentId, ForumError> {
        let content = content.trim();

        let mut errors = FieldErrors::new();
        if content.is_empty() {
            errors.add("content", "Comment cannot be empty");
        } else if content.chars().count() > COMMENT_MAX {
            errors.add("content", "Comment is too long (up to 2000 characters)");
        }
        errors.into_result()?;

        if !self.db.post_exists(post_id)? {
            return Err(ForumError::NotFound("Post".into()));
        }

        let comment_id = self
            .db
            .insert_comment(post_id, author.user_id, content, self.clock.now())?;
        info!("Comment {} on post {} by {}", comment_id, post_id, author.username);
        Ok(comment_id)
    }
}
