use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::forms::DailyForm;
use crate::models::DailyWithAuthor;
use crate::pagination::PageMeta;

use super::contains_pattern;

const DAILY_COLUMNS: &str = "SELECT d.id, d.user_id, u.username, u.first_name, u.last_name, \
     d.title, d.report_y, d.report_w, d.report_t, d.create_date, d.\"release\" \
     FROM dailies d JOIN users u ON u.id = d.user_id";

const DAILY_ORDER: &str = "ORDER BY d.create_date DESC, d.id DESC";

/// One page of released dailies, newest first.
pub async fn public_list(
    db: &SqlitePool,
    requested_page: i64,
) -> Result<(PageMeta, Vec<DailyWithAuthor>)> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dailies WHERE \"release\" = 1")
        .fetch_one(db)
        .await?;
    let page = PageMeta::new(count, requested_page);

    let sql = format!(
        "{} WHERE d.\"release\" = 1 {} LIMIT ?1 OFFSET ?2",
        DAILY_COLUMNS, DAILY_ORDER
    );
    let dailys = sqlx::query_as::<_, DailyWithAuthor>(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(db)
        .await?;
    Ok((page, dailys))
}

/// One page of a single user's dailies. Unreleased rows appear only when the
/// subject views their own page.
pub async fn user_list(
    db: &SqlitePool,
    subject_id: i64,
    include_unreleased: bool,
    requested_page: i64,
) -> Result<(PageMeta, Vec<DailyWithAuthor>)> {
    let release_clause = if include_unreleased {
        ""
    } else {
        " AND d.\"release\" = 1"
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM dailies d WHERE d.user_id = ?1{}",
        release_clause
    );
    let count: i64 = sqlx::query_scalar(&count_sql)
        .bind(subject_id)
        .fetch_one(db)
        .await?;
    let page = PageMeta::new(count, requested_page);

    let sql = format!(
        "{} WHERE d.user_id = ?1{} {} LIMIT ?2 OFFSET ?3",
        DAILY_COLUMNS, release_clause, DAILY_ORDER
    );
    let dailys = sqlx::query_as::<_, DailyWithAuthor>(&sql)
        .bind(subject_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(db)
        .await?;
    Ok((page, dailys))
}

/// Keyword search over released dailies. Each word is OR-matched against the
/// author's first and last name and the three report texts; words are then
/// OR-combined, so any word hitting any field selects the row.
pub async fn search(db: &SqlitePool, words: &[String]) -> Result<Vec<DailyWithAuthor>> {
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut clause = String::new();
    for i in 0..words.len() {
        if i > 0 {
            clause.push_str(" OR ");
        }
        clause.push_str(
            "(u.first_name LIKE ? ESCAPE '\\' OR u.last_name LIKE ? ESCAPE '\\' \
             OR d.report_y LIKE ? ESCAPE '\\' OR d.report_w LIKE ? ESCAPE '\\' \
             OR d.report_t LIKE ? ESCAPE '\\')",
        );
    }
    let sql = format!(
        "{} WHERE d.\"release\" = 1 AND ({}) {}",
        DAILY_COLUMNS, clause, DAILY_ORDER
    );

    let mut query = sqlx::query_as::<_, DailyWithAuthor>(&sql);
    for word in words {
        let pattern = contains_pattern(word);
        for _ in 0..5 {
            query = query.bind(pattern.clone());
        }
    }
    Ok(query.fetch_all(db).await?)
}

pub async fn get(db: &SqlitePool, daily_id: i64) -> Result<DailyWithAuthor> {
    let sql = format!("{} WHERE d.id = ?1", DAILY_COLUMNS);
    sqlx::query_as::<_, DailyWithAuthor>(&sql)
        .bind(daily_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("daily"))
}

pub async fn insert(
    db: &SqlitePool,
    user_id: i64,
    form: &DailyForm,
    create_date: NaiveDate,
) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO dailies (user_id, title, report_y, report_w, report_t, create_date, \"release\") \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(user_id)
    .bind(&form.title)
    .bind(&form.report_y)
    .bind(&form.report_w)
    .bind(&form.report_t)
    .bind(create_date)
    .bind(form.release)
    .execute(db)
    .await?;
    Ok(done.last_insert_rowid())
}

/// Updates the report fields; the creation date never changes after insert.
pub async fn update(db: &SqlitePool, daily_id: i64, form: &DailyForm) -> Result<()> {
    sqlx::query(
        "UPDATE dailies SET title = ?1, report_y = ?2, report_w = ?3, report_t = ?4, \"release\" = ?5 \
         WHERE id = ?6",
    )
    .bind(&form.title)
    .bind(&form.report_y)
    .bind(&form.report_w)
    .bind(&form.report_t)
    .bind(form.release)
    .bind(daily_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, daily_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM dailies WHERE id = ?1")
        .bind(daily_id)
        .execute(db)
        .await?;
    Ok(())
}
