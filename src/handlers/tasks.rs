use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Redirect, Response};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{self, login_redirect};
use crate::error::Result;
use crate::forms::{de_opt_date, FieldErrors, TaskFormSet, TaskSearchForm};
use crate::models::Task;
use crate::pagination::PageMeta;
use crate::services::task;
use crate::AppState;

#[derive(Deserialize)]
pub struct TaskPageParams {
    #[serde(default)]
    page: i64,
    #[serde(default, deserialize_with = "de_opt_date")]
    date_min: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_date")]
    date_max: Option<NaiveDate>,
}

#[derive(Serialize)]
struct TaskListPage {
    tasks: Vec<Task>,
    page: PageMeta,
    is_paginated: bool,
    /// The same rows again, as the editable form-set the page renders.
    task_form: Vec<Task>,
    task_search_form: TaskSearchForm,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    errors: FieldErrors,
}

async fn render_task_page(
    state: &AppState,
    user_id: i64,
    params: &TaskPageParams,
    errors: FieldErrors,
) -> Result<Response> {
    let (page, tasks) = task::narrowed_page(
        &state.db,
        user_id,
        params.date_min,
        params.date_max,
        params.page,
    )
    .await?;
    Ok(Json(TaskListPage {
        task_form: tasks.clone(),
        tasks,
        page,
        is_paginated: true,
        task_search_form: TaskSearchForm {
            date_min: params.date_min,
            date_max: params.date_max,
        },
        errors,
    })
    .into_response())
}

pub async fn task_page(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<TaskPageParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    render_task_page(&state, auth_state.user_id, &params, FieldErrors::default()).await
}

/// Applies the submitted form-set, then shows the task page again with any
/// per-row errors.
pub async fn edit_in_task_page(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<TaskPageParams>,
    Json(form_set): Json<TaskFormSet>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let errors = task::apply_form_set(
        &state.db,
        auth_state.user_id,
        &form_set,
        Utc::now().date_naive(),
    )
    .await?;
    render_task_page(&state, auth_state.user_id, &params, errors).await
}

/// Same application, submitted from a report page; returns there instead.
pub async fn edit_in_daily_page(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(form_set): Json<TaskFormSet>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    task::apply_form_set(
        &state.db,
        auth_state.user_id,
        &form_set,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Redirect::to("/report").into_response())
}

#[derive(Serialize)]
struct TaskNarrowPage {
    task_form: Vec<Task>,
    task_search_form: TaskSearchForm,
}

/// The date-narrowed task list without pagination.
pub async fn narrow_by_date(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<TaskPageParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let tasks = task::narrowed(&state.db, auth_state.user_id, params.date_min, params.date_max)
        .await?;
    Ok(Json(TaskNarrowPage {
        task_form: tasks,
        task_search_form: TaskSearchForm {
            date_min: params.date_min,
            date_max: params.date_max,
        },
    })
    .into_response())
}
