use rusqlite::Connection;
use tracing::info;

use crate::Result;

const V1_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        email       TEXT NOT NULL UNIQUE,
        username    TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token       TEXT PRIMARY KEY,
        user_id     INTEGER NOT NULL REFERENCES users(id),
        expires_at  TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

    CREATE TABLE IF NOT EXISTS categories (
        id          INTEGER PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS posts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     INTEGER NOT NULL REFERENCES users(id),
        title       TEXT NOT NULL,
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);

    CREATE TABLE IF NOT EXISTS post_categories (
        post_id     INTEGER NOT NULL REFERENCES posts(id),
        category_id INTEGER NOT NULL REFERENCES categories(id),
        PRIMARY KEY (post_id, category_id)
    );

    CREATE TABLE IF NOT EXISTS comments (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id     INTEGER NOT NULL REFERENCES posts(id),
        user_id     INTEGER NOT NULL REFERENCES users(id),
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at);

    CREATE TABLE IF NOT EXISTS post_reactions (
        post_id     INTEGER NOT NULL REFERENCES posts(id),
        user_id     INTEGER NOT NULL REFERENCES users(id),
        is_like     INTEGER NOT NULL,
        UNIQUE(post_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS comment_reactions (
        comment_id  INTEGER NOT NULL REFERENCES comments(id),
        user_id     INTEGER NOT NULL REFERENCES users(id),
        is_like     INTEGER NOT NULL,
        UNIQUE(comment_id, user_id)
    );

    INSERT OR IGNORE INTO categories (id, name) VALUES
        (1, 'General'),
        (2, 'News'),
        (3, 'Questions'),
        (4, 'Off-topic');
";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        apply(conn, 1, V1_SCHEMA)?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// Run one migration step and record its version. A failing statement rolls
/// back the whole step.
fn apply(conn: &Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    tx.commit()?;
    Ok(())
}
