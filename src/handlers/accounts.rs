use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json, Redirect, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{self, login_redirect};
use crate::crypto;
use crate::error::Result;
use crate::forms::{FieldErrors, ProfileForm, RegisterForm};
use crate::services::user;
use crate::AppState;

// Verified against when the username does not exist, so login cost is the
// same for known and unknown names.
const DUMMY_HASH: &str = "$2b$12$dummy.hash.for.timing.protection.with.enough.length.here.ok";

pub async fn root() -> Redirect {
    Redirect::to("/report")
}

pub async fn login_page() -> Json<serde_json::Value> {
    Json(json!({"form": {"username": "", "password": ""}}))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
    #[serde(default)]
    remember_me: bool,
}

#[derive(Serialize)]
struct LoginUser {
    id: i64,
    username: String,
    is_admin: bool,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<LoginUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let found = user::by_username(&state.db, &req.username).await?;
    let hash = found
        .as_ref()
        .map(|user| user.password_hash.clone())
        .unwrap_or_else(|| DUMMY_HASH.to_string());

    // Always run the verification, against the dummy hash if need be.
    let password_valid = crypto::verify_password(&req.password, &hash)
        .await
        .unwrap_or(false);

    if let (true, Some(user)) = (password_valid, found) {
        let session_id = auth::create_session(user.id, &state.sessions).await;
        let cookie = if req.remember_me {
            format!(
                "session_id={}; HttpOnly; Path=/; Max-Age=86400; SameSite=Strict",
                session_id
            )
        } else {
            format!("session_id={}; HttpOnly; Path=/; SameSite=Strict", session_id)
        };
        let mut headers = HeaderMap::new();
        headers.insert(header::SET_COOKIE, cookie.parse().unwrap());

        return Ok((
            headers,
            Json(LoginResponse {
                success: true,
                user: Some(LoginUser {
                    id: user.id,
                    username: user.username,
                    is_admin: user.is_admin,
                }),
                message: None,
            }),
        )
            .into_response());
    }

    Ok(Json(LoginResponse {
        success: false,
        user: None,
        message: Some("Invalid credentials".to_string()),
    })
    .into_response())
}

pub async fn logout(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }
    auth::destroy_session(&headers, &state.sessions).await;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        "session_id=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict"
            .parse()
            .unwrap(),
    );
    Ok((response_headers, Json(json!({"success": true}))).into_response())
}

#[derive(Serialize)]
struct RegisterPage {
    form: RegisterForm,
    errors: FieldErrors,
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Response> {
    let mut errors = form.validate();
    if errors.is_empty() {
        let password_hash = crypto::hash_password(&form.password).await?;
        match user::create(&state.db, &form, &password_hash, Utc::now()).await? {
            Some(user_id) => {
                log::info!("registered user {} (id {})", form.username, user_id);
                return Ok(Redirect::to("/login").into_response());
            }
            None => errors.add("username", "A user with that username already exists."),
        }
    }
    Ok(Json(RegisterPage { form, errors }).into_response())
}

#[derive(Serialize)]
struct ProfilePage {
    form: ProfileForm,
    errors: FieldErrors,
}

pub async fn edit_profile(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(form): Json<ProfileForm>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    if !auth::can_modify(&auth_state, user_id) {
        log::warn!(
            "user {} denied profile edit of user {}",
            auth_state.user_id,
            user_id
        );
        return Ok(login_redirect());
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Json(ProfilePage { form, errors }).into_response());
    }
    user::update_profile(&state.db, user_id, &form).await?;
    Ok(Redirect::to("/user").into_response())
}

pub async fn user_data(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    let user = user::get(&state.db, auth_state.user_id).await?;
    Ok(Json(user).into_response())
}
