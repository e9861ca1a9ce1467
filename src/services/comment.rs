use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentWithAuthor};

/// All comments on a daily, oldest first, joined with the author's username.
pub async fn for_daily(db: &SqlitePool, daily_id: i64) -> Result<Vec<CommentWithAuthor>> {
    Ok(sqlx::query_as::<_, CommentWithAuthor>(
        "SELECT c.id, c.daily_id, c.user_id, u.username, c.comment, c.create_date \
         FROM comments c JOIN users u ON u.id = c.user_id \
         WHERE c.daily_id = ?1 ORDER BY c.id",
    )
    .bind(daily_id)
    .fetch_all(db)
    .await?)
}

pub async fn get(db: &SqlitePool, comment_id: i64) -> Result<Comment> {
    sqlx::query_as::<_, Comment>(
        "SELECT id, daily_id, user_id, comment, create_date FROM comments WHERE id = ?1",
    )
    .bind(comment_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("comment"))
}

pub async fn insert(
    db: &SqlitePool,
    daily_id: i64,
    user_id: i64,
    text: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO comments (daily_id, user_id, comment, create_date) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(daily_id)
    .bind(user_id)
    .bind(text)
    .bind(now)
    .execute(db)
    .await?;
    Ok(done.last_insert_rowid())
}

pub async fn update(db: &SqlitePool, comment_id: i64, text: &str) -> Result<()> {
    sqlx::query("UPDATE comments SET comment = ?1 WHERE id = ?2")
        .bind(text)
        .bind(comment_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, comment_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = ?1")
        .bind(comment_id)
        .execute(db)
        .await?;
    Ok(())
}
