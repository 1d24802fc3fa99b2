use std::collections::HashMap;

use agora_types::models::ReactionCounts;
use agora_types::reactions::{ReactionAction, ReactionState, TargetKind};
use rusqlite::{Connection, params, params_from_iter};
use tracing::debug;

use crate::queries::{MAX_IDS_PER_QUERY, placeholders};
use crate::{Database, OptionalExt, Result};

/// Storage relation backing each target kind: (reaction table, key column, target table).
///
/// This is the only place a kind turns into SQL identifiers.
fn relation(kind: TargetKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        TargetKind::Post => ("post_reactions", "post_id", "posts"),
        TargetKind::Comment => ("comment_reactions", "comment_id", "comments"),
    }
}

impl Database {
    /// Apply a like/dislike toggle for `(kind, target_id, user_id)`.
    ///
    /// Read, decide and write happen in one IMMEDIATE transaction, so two
    /// concurrent toggles on the same key serialize into two transitions.
    /// Returns `None` without writing if the target does not exist.
    pub fn toggle_reaction(
        &self,
        kind: TargetKind,
        target_id: i64,
        user_id: i64,
        action: ReactionAction,
    ) -> Result<Option<ReactionState>> {
        let (table, column, target_table) = relation(kind);

        self.with_tx(|tx| {
            let exists: bool = tx.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {target_table} WHERE id = ?1)"),
                [target_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            let current = query_is_like(tx, table, column, target_id, user_id)?;
            let next = ReactionState::from_row(current).apply(action);

            match next {
                ReactionState::None => {
                    tx.execute(
                        &format!("DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2"),
                        params![target_id, user_id],
                    )?;
                }
                ReactionState::Liked | ReactionState::Disliked => {
                    let is_like = action.is_like();
                    if current.is_some() {
                        tx.execute(
                            &format!("UPDATE {table} SET is_like = ?3 WHERE {column} = ?1 AND user_id = ?2"),
                            params![target_id, user_id, is_like],
                        )?;
                    } else {
                        tx.execute(
                            &format!("INSERT INTO {table} ({column}, user_id, is_like) VALUES (?1, ?2, ?3)"),
                            params![target_id, user_id, is_like],
                        )?;
                    }
                }
            }

            debug!("Reaction {kind} {target_id} by user {user_id}: {current:?} -> {next:?}");
            Ok(Some(next))
        })
    }

    pub fn get_reaction_state(&self, kind: TargetKind, target_id: i64, user_id: i64) -> Result<ReactionState> {
        let (table, column, _) = relation(kind);
        self.with_conn(|conn| {
            let current = query_is_like(conn, table, column, target_id, user_id)?;
            Ok(ReactionState::from_row(current))
        })
    }

    pub fn count_reactions(&self, kind: TargetKind, target_id: i64) -> Result<ReactionCounts> {
        let (table, column, _) = relation(kind);
        self.with_conn(|conn| {
            let (likes, dislikes): (i64, i64) = conn.query_row(
                &format!(
                    "SELECT COALESCE(SUM(is_like = 1), 0), COALESCE(SUM(is_like = 0), 0)
                     FROM {table} WHERE {column} = ?1"
                ),
                [target_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts(likes, dislikes))
        })
    }

    /// Batch variant of [`Database::count_reactions`]. Targets without any
    /// reaction are absent from the map.
    pub fn count_reactions_for(&self, kind: TargetKind, target_ids: &[i64]) -> Result<HashMap<i64, ReactionCounts>> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let (table, column, _) = relation(kind);
        self.with_conn(|conn| {
            let mut counts_by_id = HashMap::with_capacity(target_ids.len());
            for chunk in target_ids.chunks(MAX_IDS_PER_QUERY) {
                let sql = format!(
                    "SELECT {column}, SUM(is_like = 1), SUM(is_like = 0)
                     FROM {table}
                     WHERE {column} IN ({})
                     GROUP BY {column}",
                    placeholders(chunk.len())
                );

                let mut stmt = conn.prepare_cached(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
                })?;
                for row in rows {
                    let (id, likes, dislikes) = row?;
                    counts_by_id.insert(id, counts(likes, dislikes));
                }
            }

            Ok(counts_by_id)
        })
    }
}

fn query_is_like(
    conn: &Connection,
    table: &str,
    column: &str,
    target_id: i64,
    user_id: i64,
) -> Result<Option<bool>> {
    conn.query_row(
        &format!("SELECT is_like FROM {table} WHERE {column} = ?1 AND user_id = ?2"),
        params![target_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

fn counts(likes: i64, dislikes: i64) -> ReactionCounts {
    ReactionCounts {
        likes: likes.max(0) as u64,
        dislikes: dislikes.max(0) as u64,
    }
}
