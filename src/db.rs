use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;

/// Open (creating if necessary) the database behind `url`.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(sqlx::Error::from)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new();
    if url.contains(":memory:") {
        // An in-memory database exists per connection; more than one pooled
        // connection would each see their own empty schema.
        pool_options = pool_options.max_connections(1).min_connections(1);
    }

    Ok(pool_options.connect_with(options).await?)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        username        TEXT NOT NULL UNIQUE,
        first_name      TEXT NOT NULL DEFAULT '',
        last_name       TEXT NOT NULL DEFAULT '',
        password_hash   TEXT NOT NULL,
        is_admin        INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS dailies (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title           TEXT NOT NULL,
        report_y        TEXT NOT NULL DEFAULT '',
        report_w        TEXT NOT NULL DEFAULT '',
        report_t        TEXT NOT NULL DEFAULT '',
        create_date     TEXT NOT NULL,
        \"release\"       INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name            TEXT NOT NULL,
        complete        INTEGER NOT NULL DEFAULT 0,
        implement_date  TEXT NOT NULL,
        create_date     TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        daily_id        INTEGER NOT NULL REFERENCES dailies(id) ON DELETE CASCADE,
        user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        comment         TEXT NOT NULL,
        create_date     TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL,
        publisher       TEXT NOT NULL DEFAULT '',
        page            INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS impressions (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id         INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        comment         TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_dailies_create_date ON dailies(create_date)",
    "CREATE INDEX IF NOT EXISTS idx_dailies_user_id ON dailies(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_implement ON tasks(user_id, implement_date)",
    "CREATE INDEX IF NOT EXISTS idx_comments_daily_id ON comments(daily_id)",
    "CREATE INDEX IF NOT EXISTS idx_impressions_book_id ON impressions(book_id)",
];

/// Create all tables and indexes that do not exist yet.
pub async fn init_schema(db: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db).await?;
    }
    Ok(())
}
