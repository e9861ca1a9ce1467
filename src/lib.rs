use std::collections::HashMap;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

pub mod auth;
pub mod context;
pub mod crypto;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod services;

pub type AppState = Arc<AppData>;

#[derive(Clone)]
pub struct AppData {
    pub db: SqlitePool,
    pub sessions: auth::SessionMap,
}

impl AppData {
    pub fn new(db: SqlitePool) -> AppData {
        AppData {
            db,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

pub fn app(state: AppState) -> Router {
    use handlers::{accounts, admin, cms, comments, daily, tasks};

    Router::new()
        .route("/", get(accounts::root))
        .route("/login", get(accounts::login_page))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/register", post(accounts::register))
        .route("/register/:user_id", post(accounts::edit_profile))
        .route("/user", get(accounts::user_data))
        .route("/admin/users", get(admin::user_list))
        .route("/admin/users/:user_id/delete", post(admin::delete_user))
        .route("/report", get(daily::daily_list))
        .route("/report/search", get(daily::search_daily))
        .route("/report/daily/:daily_id", get(daily::daily_detail))
        .route("/report/daily/edit", get(daily::edit_new))
        .route("/report/daily/edit", post(daily::save_new))
        .route("/report/daily/edit/:daily_id", get(daily::edit_existing))
        .route("/report/daily/edit/:daily_id", post(daily::save_existing))
        .route("/report/daily/delete/:daily_id", post(daily::delete_daily))
        .route("/report/user/:user_id", get(daily::user_daily))
        .route("/report/users", get(daily::user_list))
        .route("/report/users/search", get(daily::search_users))
        .route("/report/task", get(tasks::task_page))
        .route("/report/task", post(tasks::edit_in_task_page))
        .route("/report/task/daily", post(tasks::edit_in_daily_page))
        .route("/report/task/narrowing", get(tasks::narrow_by_date))
        .route("/report/comment/:daily_id", get(comments::edit_new))
        .route("/report/comment/:daily_id", post(comments::save_new))
        .route("/report/comment/:daily_id/:comment_id", get(comments::edit_existing))
        .route("/report/comment/:daily_id/:comment_id", post(comments::save_existing))
        .route(
            "/report/comment/:daily_id/delete/:comment_id",
            post(comments::delete_comment),
        )
        .route("/cms/books", get(cms::book_list))
        .route("/cms/books/:book_id", get(cms::book_detail))
        .route("/cms/books/edit", get(cms::edit_new))
        .route("/cms/books/edit", post(cms::save_new))
        .route("/cms/books/edit/:book_id", get(cms::edit_existing))
        .route("/cms/books/edit/:book_id", post(cms::save_existing))
        .route("/cms/books/delete/:book_id", post(cms::delete_book))
        .route("/cms/impressions/:book_id", get(cms::impression_new))
        .route("/cms/impressions/:book_id", post(cms::save_impression_new))
        .route(
            "/cms/impressions/:book_id/:impression_id",
            get(cms::impression_existing),
        )
        .route(
            "/cms/impressions/:book_id/:impression_id",
            post(cms::save_impression_existing),
        )
        .route(
            "/cms/impressions/:book_id/delete/:impression_id",
            post(cms::delete_impression),
        )
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024)) // 2MB limit
        .layer(CorsLayer::permissive())
        .with_state(state)
}
