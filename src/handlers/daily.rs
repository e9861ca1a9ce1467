use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Redirect, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{self, login_redirect};
use crate::context::{self, TaskWidgets};
use crate::error::Result;
use crate::forms::{self, CommentForm, DailyForm, FieldErrors};
use crate::handlers::EditTarget;
use crate::models::{CommentWithAuthor, DailyWithAuthor, Task, User};
use crate::pagination::PageMeta;
use crate::services::{comment, daily, task, user};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    // Missing or out-of-range pages are clamped by PageMeta.
    #[serde(default)]
    page: i64,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    keyword: String,
}

#[derive(Serialize)]
struct DailyListPage {
    dailys: Vec<DailyWithAuthor>,
    page: PageMeta,
    is_paginated: bool,
    #[serde(flatten)]
    widgets: TaskWidgets,
}

pub async fn daily_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let (page, dailys) = daily::public_list(&state.db, params.page).await?;
    let widgets =
        context::task_widgets(&state.db, auth_state.user_id, Utc::now().date_naive()).await?;
    Ok(Json(DailyListPage {
        dailys,
        page,
        is_paginated: true,
        widgets,
    })
    .into_response())
}

#[derive(Serialize)]
struct DailySearchPage {
    keyword: String,
    dailys: Vec<DailyWithAuthor>,
    is_paginated: bool,
    #[serde(flatten)]
    widgets: TaskWidgets,
}

/// Keyword search over released dailies. A blank keyword goes back to the
/// plain list; results are never paginated.
pub async fn search_daily(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let words = forms::split_keywords(&params.keyword);
    if words.is_empty() {
        return Ok(Redirect::to("/report").into_response());
    }

    let dailys = daily::search(&state.db, &words).await?;
    let widgets =
        context::task_widgets(&state.db, auth_state.user_id, Utc::now().date_naive()).await?;
    Ok(Json(DailySearchPage {
        keyword: params.keyword,
        dailys,
        is_paginated: false,
        widgets,
    })
    .into_response())
}

#[derive(Serialize)]
struct DailyDetailPage {
    daily: DailyWithAuthor,
    comments: Vec<CommentWithAuthor>,
    comment_form: CommentForm,
    implement_task: Vec<Task>,
    create_task: Vec<Task>,
    #[serde(flatten)]
    widgets: TaskWidgets,
}

pub async fn daily_detail(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let daily = daily::get(&state.db, daily_id).await?;
    let comments = comment::for_daily(&state.db, daily_id).await?;
    // The day panels belong to the daily's author, pinned to its date.
    let implement_task = task::implemented_on(&state.db, daily.user_id, daily.create_date).await?;
    let create_task = task::created_on(&state.db, daily.user_id, daily.create_date).await?;
    let widgets =
        context::task_widgets(&state.db, auth_state.user_id, Utc::now().date_naive()).await?;

    Ok(Json(DailyDetailPage {
        daily,
        comments,
        comment_form: CommentForm::default(),
        implement_task,
        create_task,
        widgets,
    })
    .into_response())
}

#[derive(Serialize)]
struct DailyEditPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    daily: Option<DailyWithAuthor>,
    report_form: DailyForm,
    errors: FieldErrors,
    implement_task: Vec<Task>,
    create_task: Vec<Task>,
    #[serde(flatten)]
    widgets: TaskWidgets,
}

pub async fn edit_new(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    edit_page(headers, state, EditTarget::Create).await
}

pub async fn edit_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
) -> Result<Response> {
    edit_page(headers, state, EditTarget::Existing(daily_id)).await
}

async fn edit_page(headers: HeaderMap, state: AppState, target: EditTarget) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    let today = Utc::now().date_naive();

    let (daily, form, date) = match target {
        EditTarget::Existing(daily_id) => {
            let daily = daily::get(&state.db, daily_id).await?;
            if !auth::can_modify(&auth_state, daily.user_id) {
                log::warn!(
                    "user {} denied edit of daily {}",
                    auth_state.user_id,
                    daily_id
                );
                return Ok(login_redirect());
            }
            let form = DailyForm {
                title: daily.title.clone(),
                report_y: daily.report_y.clone(),
                report_w: daily.report_w.clone(),
                report_t: daily.report_t.clone(),
                release: daily.release,
                gototask: false,
            };
            let date = daily.create_date;
            (Some(daily), form, date)
        }
        EditTarget::Create => (None, DailyForm::default(), today),
    };

    let implement_task = task::implemented_on(&state.db, auth_state.user_id, date).await?;
    let create_task = task::created_on(&state.db, auth_state.user_id, date).await?;
    let widgets = context::task_widgets(&state.db, auth_state.user_id, today).await?;
    Ok(Json(DailyEditPage {
        daily,
        report_form: form,
        errors: FieldErrors::default(),
        implement_task,
        create_task,
        widgets,
    })
    .into_response())
}

pub async fn save_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(form): Json<DailyForm>,
) -> Result<Response> {
    submit_edit(headers, state, EditTarget::Create, form).await
}

pub async fn save_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
    Json(form): Json<DailyForm>,
) -> Result<Response> {
    submit_edit(headers, state, EditTarget::Existing(daily_id), form).await
}

async fn submit_edit(
    headers: HeaderMap,
    state: AppState,
    target: EditTarget,
    form: DailyForm,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };
    let today = Utc::now().date_naive();

    // Existence and ownership are settled before anything else happens.
    let existing = match target {
        EditTarget::Existing(daily_id) => {
            let daily = daily::get(&state.db, daily_id).await?;
            if !auth::can_modify(&auth_state, daily.user_id) {
                log::warn!(
                    "user {} denied edit of daily {}",
                    auth_state.user_id,
                    daily_id
                );
                return Ok(login_redirect());
            }
            Some(daily)
        }
        EditTarget::Create => None,
    };

    // Secondary submit: jump to the task page, saving nothing.
    if form.gototask {
        return Ok(Redirect::to("/report/task").into_response());
    }

    let errors = form.validate();
    if !errors.is_empty() {
        let date = existing.as_ref().map(|d| d.create_date).unwrap_or(today);
        let implement_task = task::implemented_on(&state.db, auth_state.user_id, date).await?;
        let create_task = task::created_on(&state.db, auth_state.user_id, date).await?;
        let widgets = context::task_widgets(&state.db, auth_state.user_id, today).await?;
        return Ok(Json(DailyEditPage {
            daily: existing,
            report_form: form,
            errors,
            implement_task,
            create_task,
            widgets,
        })
        .into_response());
    }

    let daily_id = match existing {
        Some(daily) => {
            daily::update(&state.db, daily.id, &form).await?;
            daily.id
        }
        None => daily::insert(&state.db, auth_state.user_id, &form, today).await?,
    };
    Ok(Redirect::to(&format!("/report/daily/{}", daily_id)).into_response())
}

pub async fn delete_daily(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(daily_id): Path<i64>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let daily = daily::get(&state.db, daily_id).await?;
    if !auth::can_modify(&auth_state, daily.user_id) {
        log::warn!(
            "user {} denied delete of daily {}",
            auth_state.user_id,
            daily_id
        );
        return Ok(login_redirect());
    }

    daily::delete(&state.db, daily_id).await?;
    Ok(Redirect::to(&format!("/report/user/{}", auth_state.user_id)).into_response())
}

#[derive(Serialize)]
struct UserDailyPage {
    userinfo: User,
    dailys: Vec<DailyWithAuthor>,
    page: PageMeta,
    is_paginated: bool,
    #[serde(flatten)]
    widgets: TaskWidgets,
}

/// A single user's report page. The owner sees unreleased rows as well.
pub async fn user_daily(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response> {
    let auth_state = match auth::verify_session(&headers, &state.sessions, &state.db).await? {
        Some(auth_state) => auth_state,
        None => return Ok(login_redirect()),
    };

    let userinfo = user::get(&state.db, user_id).await?;
    let own_page = auth_state.user_id == user_id;
    let (page, dailys) = daily::user_list(&state.db, user_id, own_page, params.page).await?;
    let widgets =
        context::task_widgets(&state.db, auth_state.user_id, Utc::now().date_naive()).await?;

    Ok(Json(UserDailyPage {
        userinfo,
        dailys,
        page,
        is_paginated: true,
        widgets,
    })
    .into_response())
}

#[derive(Serialize)]
struct UserListPage {
    users: Vec<User>,
    keyword: String,
}

pub async fn user_list(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let users = user::directory(&state.db).await?;
    Ok(Json(UserListPage {
        users,
        keyword: String::new(),
    })
    .into_response())
}

/// Single-keyword user search; a blank keyword shows everyone.
pub async fn search_users(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let keyword = params.keyword.trim();
    let users = if keyword.is_empty() {
        user::directory(&state.db).await?
    } else {
        user::search(&state.db, keyword).await?
    };
    Ok(Json(UserListPage {
        users,
        keyword: keyword.to_string(),
    })
    .into_response())
}
