use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params, params_from_iter};

use crate::models::{CategoryRow, CommentRow, PostRow, SessionRow, UserRow};
use crate::{Database, OptionalExt, Result, time_col, to_db_time};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![email, username, password_hash, to_db_time(created_at)],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn email_taken(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?)
        })
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Sessions --

    pub fn insert_session(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, to_db_time(expires_at)],
            )?;
            Ok(())
        })
    }

    /// Drop every session of `user_id` and insert the new one, atomically.
    /// Returns how many sessions were revoked.
    pub fn replace_sessions(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<usize> {
        self.with_tx(|tx| {
            let revoked = tx.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
            tx.execute(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, to_db_time(expires_at)],
            )?;
            Ok(revoked)
        })
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT s.token, s.user_id, u.username, s.expires_at
                 FROM sessions s
                 JOIN users u ON s.user_id = u.id
                 WHERE s.token = ?1",
                [token],
                |row| {
                    Ok(SessionRow {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        expires_at: time_col(row, 3)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?))
    }

    pub fn delete_sessions_expired_before(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                [to_db_time(now)],
            )?)
        })
    }

    pub fn count_sessions_for_user(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?)
        })
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok(CategoryRow { id: row.get(0)?, name: row.get(1)? }))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch category lists for a set of posts as `(post_id, category)` pairs.
    pub fn get_categories_for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, CategoryRow)>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for chunk in post_ids.chunks(MAX_IDS_PER_QUERY) {
                let sql = format!(
                    "SELECT pc.post_id, c.id, c.name
                     FROM post_categories pc
                     JOIN categories c ON c.id = pc.category_id
                     WHERE pc.post_id IN ({})
                     ORDER BY pc.post_id, c.id",
                    placeholders(chunk.len())
                );

                let mut stmt = conn.prepare_cached(&sql)?;
                let found = stmt.query_map(params_from_iter(chunk), |row| {
                    Ok((
                        row.get(0)?,
                        CategoryRow {
                            id: row.get(1)?,
                            name: row.get(2)?,
                        },
                    ))
                })?;
                for row in found {
                    rows.push(row?);
                }
            }

            Ok(rows)
        })
    }

    // -- Posts --

    /// Insert a post and its category links in one transaction.
    /// Returns `None` (and writes nothing) if any category id is unknown.
    pub fn create_post(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        category_ids: &[i64],
        created_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        self.with_tx(|tx| {
            for category_id in category_ids {
                let known: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
                    [category_id],
                    |row| row.get(0),
                )?;
                if !known {
                    return Ok(None);
                }
            }

            tx.execute(
                "INSERT INTO posts (user_id, title, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, title, content, to_db_time(created_at)],
            )?;
            let post_id = tx.last_insert_rowid();

            for category_id in category_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
                    params![post_id, category_id],
                )?;
            }

            Ok(Some(post_id))
        })
    }

    pub fn get_post(&self, post_id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT p.id, p.user_id, u.username, p.title, p.content, p.created_at
                 FROM posts p
                 JOIN users u ON p.user_id = u.id
                 WHERE p.id = ?1",
                [post_id],
                post_row,
            )
            .optional()
        })
    }

    pub fn post_exists(&self, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
                [post_id],
                |row| row.get(0),
            )?)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![post_id, user_id, content, to_db_time(created_at)],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Comments of a post, oldest first, with the author username joined in.
    pub fn get_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at
                 FROM comments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        user_id: row.get(2)?,
                        author_username: row.get(3)?,
                        content: row.get(4)?,
                        created_at: time_col(row, 5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, email, username, password, created_at FROM users WHERE email = ?1")?;

    stmt.query_row([email], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            password: row.get(3)?,
            created_at: time_col(row, 4)?,
        })
    })
    .optional()
}

/// Maps `id, user_id, username, title, content, created_at`.
pub(crate) fn post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_username: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: time_col(row, 5)?,
    })
}

/// Upper bound on ids bound into a single `IN (...)` list. SQLite caps the
/// number of host parameters per statement.
pub(crate) const MAX_IDS_PER_QUERY: usize = 500;

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
