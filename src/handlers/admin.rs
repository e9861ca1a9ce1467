use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::auth::{self, login_redirect};
use crate::error::Result;
use crate::services::user;
use crate::AppState;

#[derive(Deserialize)]
pub struct AdminListParams {
    keyword: Option<String>,
}

/// Non-admin accounts, ordered by username. Admin only.
pub async fn user_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    if !auth_state.is_admin {
        log::warn!("user {} denied admin user list", auth_state.user_id);
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    let users = user::admin_list(&state.db, params.keyword.as_deref()).await?;
    let users_json: Vec<serde_json::Value> = users
        .iter()
        .map(|user| {
            serde_json::json!({
                "id": user.id,
                "username": user.username,
                "created_at": user.created_at,
            })
        })
        .collect();
    Ok(Json(users_json).into_response())
}

#[derive(Deserialize)]
pub struct DeleteUserRequest {
    confirmation_username: String,
}

/// Deletes a non-admin account after the caller retypes its username. The
/// user's dailies, comments, and tasks go with it.
pub async fn delete_user(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<DeleteUserRequest>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    if !auth_state.is_admin {
        log::warn!(
            "user {} denied admin delete of user {}",
            auth_state.user_id,
            user_id
        );
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    let Some(username) = user::deletable_username(&state.db, user_id).await? else {
        return Ok(Json(serde_json::json!({
            "success": false,
            "message": "User not found"
        }))
        .into_response());
    };

    if username != req.confirmation_username {
        return Ok(Json(serde_json::json!({
            "success": false,
            "message": "Username confirmation does not match"
        }))
        .into_response());
    }

    user::delete(&state.db, user_id).await?;
    log::info!("admin {} deleted user {}", auth_state.username, username);
    Ok(Json(serde_json::json!({"success": true})).into_response())
}
