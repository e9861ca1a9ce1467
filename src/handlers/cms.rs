use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Serialize;

use crate::auth::{self, login_redirect};
use crate::error::Result;
use crate::forms::{BookForm, FieldErrors, ImpressionForm};
use crate::handlers::EditTarget;
use crate::models::{Book, Impression};
use crate::services::book;
use crate::AppState;

// Books and impressions carry no owner; any signed-in user may manage them.

#[derive(Serialize)]
struct BookListPage {
    books: Vec<Book>,
}

pub async fn book_list(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let books = book::list(&state.db).await?;
    Ok(Json(BookListPage { books }).into_response())
}

#[derive(Serialize)]
struct BookDetailPage {
    book: Book,
    impressions: Vec<Impression>,
    impression_form: ImpressionForm,
}

pub async fn book_detail(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let book = book::get(&state.db, book_id).await?;
    let impressions = book::impressions_for(&state.db, book_id).await?;
    Ok(Json(BookDetailPage {
        book,
        impressions,
        impression_form: ImpressionForm::default(),
    })
    .into_response())
}

#[derive(Serialize)]
struct BookEditPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    book: Option<Book>,
    book_form: BookForm,
    errors: FieldErrors,
}

pub async fn edit_new(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    book_edit_page(headers, state, EditTarget::Create).await
}

pub async fn edit_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Response> {
    book_edit_page(headers, state, EditTarget::Existing(book_id)).await
}

async fn book_edit_page(
    headers: HeaderMap,
    state: AppState,
    target: EditTarget,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let (existing, form) = match target {
        EditTarget::Existing(book_id) => {
            let book = book::get(&state.db, book_id).await?;
            let form = BookForm {
                name: book.name.clone(),
                publisher: book.publisher.clone(),
                page: book.page,
            };
            (Some(book), form)
        }
        EditTarget::Create => (None, BookForm::default()),
    };

    Ok(Json(BookEditPage {
        book: existing,
        book_form: form,
        errors: FieldErrors::default(),
    })
    .into_response())
}

pub async fn save_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(form): Json<BookForm>,
) -> Result<Response> {
    submit_book(headers, state, EditTarget::Create, form).await
}

pub async fn save_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(form): Json<BookForm>,
) -> Result<Response> {
    submit_book(headers, state, EditTarget::Existing(book_id), form).await
}

async fn submit_book(
    headers: HeaderMap,
    state: AppState,
    target: EditTarget,
    form: BookForm,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    let existing = match target {
        EditTarget::Existing(book_id) => Some(book::get(&state.db, book_id).await?),
        EditTarget::Create => None,
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Json(BookEditPage {
            book: existing,
            book_form: form,
            errors,
        })
        .into_response());
    }

    let book_id = match existing {
        Some(book) => {
            book::update(&state.db, book.id, &form).await?;
            book.id
        }
        None => book::insert(&state.db, &form).await?,
    };
    Ok(Redirect::to(&format!("/cms/books/{}", book_id)).into_response())
}

pub async fn delete_book(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    book::get(&state.db, book_id).await?;
    book::delete(&state.db, book_id).await?;
    Ok(Redirect::to("/cms/books").into_response())
}

#[derive(Serialize)]
struct ImpressionEditPage {
    book_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    impression: Option<Impression>,
    impression_form: ImpressionForm,
    errors: FieldErrors,
}

pub async fn impression_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Response> {
    impression_page(headers, state, book_id, EditTarget::Create).await
}

pub async fn impression_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((book_id, impression_id)): Path<(i64, i64)>,
) -> Result<Response> {
    impression_page(headers, state, book_id, EditTarget::Existing(impression_id)).await
}

async fn impression_page(
    headers: HeaderMap,
    state: AppState,
    book_id: i64,
    target: EditTarget,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }
    book::get(&state.db, book_id).await?;

    let (existing, form) = match target {
        EditTarget::Existing(impression_id) => {
            let impression = book::get_impression(&state.db, impression_id).await?;
            let form = ImpressionForm {
                comment: impression.comment.clone(),
            };
            (Some(impression), form)
        }
        EditTarget::Create => (None, ImpressionForm::default()),
    };

    Ok(Json(ImpressionEditPage {
        book_id,
        impression: existing,
        impression_form: form,
        errors: FieldErrors::default(),
    })
    .into_response())
}

pub async fn save_impression_new(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(form): Json<ImpressionForm>,
) -> Result<Response> {
    submit_impression(headers, state, book_id, EditTarget::Create, form).await
}

pub async fn save_impression_existing(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((book_id, impression_id)): Path<(i64, i64)>,
    Json(form): Json<ImpressionForm>,
) -> Result<Response> {
    submit_impression(headers, state, book_id, EditTarget::Existing(impression_id), form).await
}

async fn submit_impression(
    headers: HeaderMap,
    state: AppState,
    book_id: i64,
    target: EditTarget,
    form: ImpressionForm,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }
    book::get(&state.db, book_id).await?;

    let existing = match target {
        EditTarget::Existing(impression_id) => {
            Some(book::get_impression(&state.db, impression_id).await?)
        }
        EditTarget::Create => None,
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Json(ImpressionEditPage {
            book_id,
            impression: existing,
            impression_form: form,
            errors,
        })
        .into_response());
    }

    match existing {
        Some(impression) => {
            book::update_impression(&state.db, impression.id, &form.comment).await?
        }
        None => {
            book::insert_impression(&state.db, book_id, &form.comment).await?;
        }
    }
    Ok(Redirect::to(&format!("/cms/books/{}", book_id)).into_response())
}

pub async fn delete_impression(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((book_id, impression_id)): Path<(i64, i64)>,
) -> Result<Response> {
    if auth::verify_session(&headers, &state.sessions, &state.db)
        .await?
        .is_none()
    {
        return Ok(login_redirect());
    }

    book::get_impression(&state.db, impression_id).await?;
    book::delete_impression(&state.db, impression_id).await?;
    Ok(Redirect::to(&format!("/cms/books/{}", book_id)).into_response())
}
