use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A daily joined with the columns of its author that the pages display.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyWithAuthor {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub report_y: String,
    pub report_w: String,
    pub report_t: String,
    pub create_date: NaiveDate,
    pub release: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub complete: bool,
    pub implement_date: NaiveDate,
    pub create_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub daily_id: i64,
    pub user_id: i64,
    pub comment: String,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub daily_id: i64,
    pub user_id: i64,
    pub username: String,
    pub comment: String,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub publisher: String,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Impression {
    pub id: i64,
    pub book_id: i64,
    pub comment: String,
}
