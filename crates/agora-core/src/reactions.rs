use std::collections::HashMap;
use std::sync::Arc;

use agora_db::Database;
use agora_types::UserId;
use agora_types::api::ToggleReactionRequest;
use agora_types::models::{Identity, ReactionCounts};
use agora_types::reactions::{ReactionAction, ReactionState, TargetKind};
use tracing::debug;

use crate::error::ForumError;

/// Like/dislike toggles and their aggregate counts for posts and comments.
#[derive(Clone)]
pub struct ReactionEngine {
    db: Arc<Database>,
}

impl ReactionEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Apply `action` for `user_id` on a target and return the new state.
    /// The read-decide-write runs as a single transaction.
    pub fn toggle(
        &self,
        kind: TargetKind,
        target_id: i64,
        user_id: UserId,
        action: ReactionAction,
    ) -> Result<ReactionState, ForumError> {
        self.db
            .toggle_reaction(kind, target_id, user_id, action)
            .map_err(ForumError::transaction)?
            .ok_or_else(|| ForumError::NotFound(capitalize(kind)))
    }

    /// Validate a raw reaction form and toggle it. Returns the new state
    /// together with the target's counts after the change.
    pub fn toggle_request(
        &self,
        identity: Option<&Identity>,
        req: &ToggleReactionRequest,
    ) -> Result<(ReactionState, ReactionCounts), ForumError> {
        let identity = identity.ok_or(ForumError::Unauthenticated)?;
        let kind: TargetKind = req
            .kind
            .parse()
            .map_err(|_| ForumError::InvalidTargetKind(req.kind.clone()))?;
        let action: ReactionAction = req
            .action
            .parse()
            .map_err(|_| ForumError::InvalidAction(req.action.clone()))?;
        let target_id: i64 = req
            .id
            .trim()
            .parse()
            .map_err(|_| ForumError::InvalidTargetId(req.id.clone()))?;

        let state = self.toggle(kind, target_id, identity.user_id, action)?;
        let counts = self.count(kind, target_id)?;
        debug!(
            "{} toggled {:?} on {} {}: now {:?}",
            identity.username, action, kind, target_id, state
        );
        Ok((state, counts))
    }

    /// Likes and dislikes currently recorded for a target; `(0, 0)` if none.
    pub fn count(&self, kind: TargetKind, target_id: i64) -> Result<ReactionCounts, ForumError> {
        Ok(self.db.count_reactions(kind, target_id)?)
    }

    /// Counts for many targets at once. Every requested id is present in the
    /// result, zeroed if it has no reactions.
    pub fn count_many(
        &self,
        kind: TargetKind,
        target_ids: &[i64],
    ) -> Result<HashMap<i64, ReactionCounts>, ForumError> {
        let mut counts = self.db.count_reactions_for(kind, target_ids)?;
        for id in target_ids {
            counts.entry(*id).or_default();
        }
        Ok(counts)
    }

    pub fn state(&self, kind: TargetKind, target_id: i64, user_id: UserId) -> Result<ReactionState, ForumError> {
        Ok(self.db.get_reaction_state(kind, target_id, user_id)?)
    }
}

fn capitalize(kind: TargetKind) -> String {
    match kind {
        TargetKind::Post => "Post".into(),
        TargetKind::Comment => "Comment".into(),
    }
}
