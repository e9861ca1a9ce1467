use std::{collections::HashMap, sync::Arc};

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;

use crate::error::Result;

/// In-memory session store: session id -> user id. Sessions die with the
/// process.
pub type SessionMap = Arc<RwLock<HashMap<String, i64>>>;

pub struct AuthState {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

pub async fn create_session(user_id: i64, sessions: &SessionMap) -> String {
    let session_id = uuid::Uuid::new_v4().to_string();
    sessions.write().await.insert(session_id.clone(), user_id);
    session_id
}

pub async fn destroy_session(headers: &HeaderMap, sessions: &SessionMap) {
    if let Some(session_id) = extract_session_id(headers) {
        sessions.write().await.remove(&session_id);
    }
}

/// Resolve the request's session cookie to an authenticated user. `None`
/// means anonymous: no cookie, unknown session, or a user deleted since the
/// session was issued.
pub async fn verify_session(
    headers: &HeaderMap,
    sessions: &SessionMap,
    db: &SqlitePool,
) -> Result<Option<AuthState>> {
    let session_id = match extract_session_id(headers) {
        Some(session_id) => session_id,
        None => return Ok(None),
    };

    let user_id = match sessions.read().await.get(&session_id) {
        Some(user_id) => *user_id,
        None => return Ok(None),
    };

    let user_row = sqlx::query("SELECT username, is_admin FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    Ok(user_row.map(|row| AuthState {
        user_id,
        username: row.get("username"),
        is_admin: row.get("is_admin"),
    }))
}

pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    use axum::http::header;

    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookie_str| {
            cookie_str
                .split(';')
                .find(|cookie| cookie.trim().starts_with("session_id="))
                .map(|cookie| cookie.trim().strip_prefix("session_id=").unwrap_or("").to_string())
        })
}

/// The one ownership rule for mutating owned records: strictly the owner,
/// admins included only for their own rows.
pub fn can_modify(auth: &AuthState, owner_id: i64) -> bool {
    auth.user_id == owner_id
}

/// Authorization failures navigate to the login page rather than signalling
/// forbidden.
pub fn login_redirect() -> Response {
    Redirect::to("/login").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::header;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, value.parse().unwrap());
        headers
    }

    #[test]
    fn session_id_is_extracted_from_cookie_header() {
        let headers = headers_with_cookie("theme=dark; session_id=abc-123; lang=ja");
        assert_eq!(extract_session_id(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn missing_cookie_yields_no_session() {
        assert_eq!(extract_session_id(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn sessions_round_trip_and_destroy() {
        let sessions: SessionMap = Arc::new(RwLock::new(HashMap::new()));
        let session_id = create_session(7, &sessions).await;
        assert_eq!(sessions.read().await.get(&session_id), Some(&7));

        let headers = headers_with_cookie(&format!("session_id={}", session_id));
        destroy_session(&headers, &sessions).await;
        assert!(sessions.read().await.is_empty());
    }

    #[test]
    fn only_the_owner_may_modify() {
        let owner = AuthState {
            user_id: 1,
            username: "alice".to_string(),
            is_admin: false,
        };
        let admin = AuthState {
            user_id: 2,
            username: "admin".to_string(),
            is_admin: true,
        };
        assert!(can_modify(&owner, 1));
        assert!(!can_modify(&owner, 2));
        assert!(!can_modify(&admin, 1));
    }
}
