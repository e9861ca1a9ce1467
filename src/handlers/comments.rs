use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Redirect, Response};
use chrono::Utc;
use serde::Serialize;

use crate::auth::{self, login_redirect};
use crate::error::Result;
use crate::forms::{CommentForm, FieldErrors};
use crate::handlers::EditTarget;
use crate::models::Comment;
use crate::services::{comment, daily};
use crate::AppState;

#[derive(Serialize)]
struct CommentEditPage {
    daily_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<Comment>,
    comment_form: CommentForm,
    errors: FieldErrors,
}

pub async fn edit_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
) -> Result<Response> {
    comment_page(headers, state, daily_id, EditTarget::Create).await
}

pub async fn edit_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((daily_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response> {
    comment_page(headers, state, daily_id, EditTarget::Existing(comment_id)).await
}

async fn comment_page(
    headers: HeaderMap,
    state: AppState,
    daily_id: i64,
    target: EditTarget,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    daily::get(&state.db, daily_id).await?;

    let (existing, form) = match target {
        EditTarget::Existing(comment_id) => {
            let comment = comment::get(&state.db, comment_id).await?;
            if !auth::can_modify(&auth_state, comment.user_id) {
                log::warn!(
                    "user {} denied edit of comment {}",
                    auth_state.user_id,
                    comment_id
                );
                return Ok(login_redirect());
            }
            let form = CommentForm {
                comment: comment.comment.clone(),
            };
            (Some(comment), form)
        }
        EditTarget::Create => (None, CommentForm::default()),
    };

    Ok(Json(CommentEditPage {
        daily_id,
        comment: existing,
        comment_form: form,
        errors: FieldErrors::default(),
    })
    .into_response())
}

pub async fn save_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
    Json(form): Json<CommentForm>,
) -> Result<Response> {
    submit_comment(headers, state, daily_id, EditTarget::Create, form).await
}

pub async fn save_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((daily_id, comment_id)): Path<(i64, i64)>,
    Json(form): Json<CommentForm>,
) -> Result<Response> {
    submit_comment(headers, state, daily_id, EditTarget::Existing(comment_id), form).await
}

async fn submit_comment(
    headers: HeaderMap,
    state: AppState,
    daily_id: i64,
    target: EditTarget,
    form: CommentForm,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    daily::get(&state.db, daily_id).await?;

    // With an id the comment must exist and be the requester's own; without
    // one a fresh comment is bound to the requester.
    let existing = match target {
        EditTarget::Existing(comment_id) => {
            let comment = comment::get(&state.db, comment_id).await?;
            if !auth::can_modify(&auth_state, comment.user_id) {
                log::warn!(
                    "user {} denied edit of comment {}",
                    auth_state.user_id,
                    comment_id
                );
                return Ok(login_redirect());
            }
            Some(comment)
        }
        EditTarget::Create => None,
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Json(CommentEditPage {
            daily_id,
            comment: existing,
            comment_form: form,
            errors,
        })
        .into_response());
    }

    match existing {
        Some(comment) => comment::update(&state.db, comment.id, &form.comment).await?,
        None => {
            comment::insert(&state.db, daily_id, auth_state.user_id, &form.comment, Utc::now())
                .await?;
        }
    }
    Ok(Redirect::to(&format!("/report/daily/{}", daily_id)).into_response())
}

pub async fn delete_comment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((daily_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let comment = comment::get(&state.db, comment_id).await?;
    if !auth::can_modify(&auth_state, comment.user_id) {
        log::warn!(
            "user {} denied delete of comment {}",
            auth_state.user_id,
            comment_id
        );
        return Ok(login_redirect());
    }

    comment::delete(&state.db, comment_id).await?;
    Ok(Redirect::to(&format!("/report/daily/{}", daily_id)).into_response())
}
