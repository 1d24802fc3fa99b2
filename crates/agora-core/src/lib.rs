//! Agora core: identity, reactions and the post query engine.
//!
//! Every service is synchronous and receives its storage handle (and clock,
//! where time matters) at construction. Callers on an async runtime should
//! run these calls on a blocking thread.

pub mod clock;
pub mod credentials;
pub mod error;
pub mod posts;
pub mod query;
pub mod reactions;
pub mod sessions;

use std::sync::Arc;

use agora_db::Database;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::CredentialManager;
pub use error::{FieldErrors, ForumError, StatusClass};
pub use posts::PostAuthoring;
pub use query::PostQuery;
pub use reactions::ReactionEngine;
pub use sessions::SessionStore;

/// All core services wired against one database and one clock.
#[derive(Clone)]
pub struct Forum {
    pub sessions: SessionStore,
    pub credentials: CredentialManager,
    pub reactions: ReactionEngine,
    pub query: PostQuery,
    pub authoring: PostAuthoring,
}

impl Forum {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        let sessions = SessionStore::new(db.clone(), clock.clone());
        Self::with_sessions(db, clock, sessions)
    }

    pub fn with_sessions(db: Arc<Database>, clock: Arc<dyn Clock>, sessions: SessionStore) -> Self {
        let reactions = ReactionEngine::new(db.clone());
        Self {
            credentials: CredentialManager::new(db.clone(), clock.clone(), sessions.clone()),
            query: PostQuery::new(db.clone(), reactions.clone()),
            authoring: PostAuthoring::new(db, clock),
            reactions,
            sessions,
        }
    }
}
