use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a reaction is attached to. Closed set: anything else is rejected
/// before it gets anywhere near storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Like,
    Dislike,
}

impl ReactionAction {
    pub fn is_like(self) -> bool {
        matches!(self, ReactionAction::Like)
    }
}

impl FromStr for ReactionAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionAction::Like),
            "dislike" => Ok(ReactionAction::Dislike),
            _ => Err(()),
        }
    }
}

/// Per (target, user) reaction state. `None` means no row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    None,
    Liked,
    Disliked,
}

impl ReactionState {
    pub fn from_row(is_like: Option<bool>) -> Self {
        match is_like {
            None => ReactionState::None,
            Some(true) => ReactionState::Liked,
            Some(false) => ReactionState::Disliked,
        }
    }

    /// Apply an action and return the resulting state.
    ///
    /// Repeating the action that produced the current state clears it;
    /// the opposite action flips it.
    pub fn apply(self, action: ReactionAction) -> Self {
        match (self, action) {
            (ReactionState::None, ReactionAction::Like) => ReactionState::Liked,
            (ReactionState::None, ReactionAction::Dislike) => ReactionState::Disliked,
            (ReactionState::Liked, ReactionAction::Like) => ReactionState::None,
            (ReactionState::Liked, ReactionAction::Dislike) => ReactionState::Disliked,
            (ReactionState::Disliked, ReactionAction::Like) => ReactionState::Liked,
            (ReactionState::Disliked, ReactionAction::Dislike) => ReactionState::None,
        }
    }
}
