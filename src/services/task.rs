use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::forms::{FieldErrors, TaskFormSet};
use crate::models::Task;
use crate::pagination::PageMeta;

const TASK_COLUMNS: &str =
    "SELECT id, user_id, name, complete, implement_date, create_date FROM tasks";

const TASK_ORDER: &str = "ORDER BY implement_date, id";

/// Tasks scheduled for a given day.
pub async fn implemented_on(db: &SqlitePool, user_id: i64, date: NaiveDate) -> Result<Vec<Task>> {
    let sql = format!(
        "{} WHERE user_id = ?1 AND implement_date = ?2 {}",
        TASK_COLUMNS, TASK_ORDER
    );
    Ok(sqlx::query_as::<_, Task>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_all(db)
        .await?)
}

/// Tasks entered on a given day.
pub async fn created_on(db: &SqlitePool, user_id: i64, date: NaiveDate) -> Result<Vec<Task>> {
    let sql = format!(
        "{} WHERE user_id = ?1 AND create_date = ?2 {}",
        TASK_COLUMNS, TASK_ORDER
    );
    Ok(sqlx::query_as::<_, Task>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_all(db)
        .await?)
}

/// Tasks scheduled strictly after a given day.
pub async fn after(db: &SqlitePool, user_id: i64, date: NaiveDate) -> Result<Vec<Task>> {
    let sql = format!(
        "{} WHERE user_id = ?1 AND implement_date > ?2 {}",
        TASK_COLUMNS, TASK_ORDER
    );
    Ok(sqlx::query_as::<_, Task>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_all(db)
        .await?)
}

fn range_clause(date_min: Option<NaiveDate>, date_max: Option<NaiveDate>) -> String {
    let mut clause = String::from("user_id = ?");
    if date_min.is_some() {
        clause.push_str(" AND implement_date >= ?");
    }
    if date_max.is_some() {
        clause.push_str(" AND implement_date <= ?");
    }
    clause
}

/// The requester's tasks narrowed to an optional implement-date range. The
/// range never applies to `create_date`.
pub async fn narrowed(
    db: &SqlitePool,
    user_id: i64,
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
) -> Result<Vec<Task>> {
    let sql = format!(
        "{} WHERE {} {}",
        TASK_COLUMNS,
        range_clause(date_min, date_max),
        TASK_ORDER
    );
    let mut query = sqlx::query_as::<_, Task>(&sql).bind(user_id);
    if let Some(min) = date_min {
        query = query.bind(min);
    }
    if let Some(max) = date_max {
        query = query.bind(max);
    }
    Ok(query.fetch_all(db).await?)
}

/// Same narrowing as [`narrowed`], one page at a time.
pub async fn narrowed_page(
    db: &SqlitePool,
    user_id: i64,
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
    requested_page: i64,
) -> Result<(PageMeta, Vec<Task>)> {
    let clause = range_clause(date_min, date_max);

    let count_sql = format!("SELECT COUNT(*) FROM tasks WHERE {}", clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id);
    if let Some(min) = date_min {
        count_query = count_query.bind(min);
    }
    if let Some(max) = date_max {
        count_query = count_query.bind(max);
    }
    let page = PageMeta::new(count_query.fetch_one(db).await?, requested_page);

    let sql = format!(
        "{} WHERE {} {} LIMIT ? OFFSET ?",
        TASK_COLUMNS, clause, TASK_ORDER
    );
    let mut query = sqlx::query_as::<_, Task>(&sql).bind(user_id);
    if let Some(min) = date_min {
        query = query.bind(min);
    }
    if let Some(max) = date_max {
        query = query.bind(max);
    }
    let tasks = query
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(db)
        .await?;
    Ok((page, tasks))
}

/// Applies a submitted task form-set. Blank spare rows are skipped; rows with
/// an id update only the requester's own task (a foreign id matches nothing);
/// rows without an id insert a new task stamped with today's date. Invalid
/// rows are collected into the returned error map and valid rows still apply.
pub async fn apply_form_set(
    db: &SqlitePool,
    user_id: i64,
    form_set: &TaskFormSet,
    today: NaiveDate,
) -> Result<FieldErrors> {
    let mut errors = FieldErrors::default();
    for (index, row) in form_set.tasks.iter().enumerate() {
        if row.is_blank() {
            continue;
        }

        let mut row_errors = FieldErrors::default();
        row.validate_into(index, &mut row_errors);
        if !row_errors.is_empty() {
            errors.merge(row_errors);
            continue;
        }
        let Some(implement_date) = row.implement_date else {
            continue;
        };

        match row.id {
            Some(task_id) => {
                sqlx::query(
                    "UPDATE tasks SET name = ?1, complete = ?2, implement_date = ?3 \
                     WHERE id = ?4 AND user_id = ?5",
                )
                .bind(&row.name)
                .bind(row.complete)
                .bind(implement_date)
                .bind(task_id)
                .bind(user_id)
                .execute(db)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO tasks (user_id, name, complete, implement_date, create_date) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .bind(user_id)
                .bind(&row.name)
                .bind(row.complete)
                .bind(implement_date)
                .bind(today)
                .execute(db)
                .await?;
            }
        }
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::TaskRowForm;
    use chrono::Utc;

    async fn test_db() -> SqlitePool {
        let db = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&db).await.unwrap();
        db
    }

    async fn seed_user(db: &SqlitePool, username: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, first_name, last_name, password_hash, is_admin, created_at) \
             VALUES (?1, 'f', 'l', 'x', 0, ?2)",
        )
        .bind(username)
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn seed_task(
        db: &SqlitePool,
        user_id: i64,
        name: &str,
        implement: NaiveDate,
        create: NaiveDate,
    ) -> i64 {
        sqlx::query(
            "INSERT INTO tasks (user_id, name, complete, implement_date, create_date) \
             VALUES (?1, ?2, 0, ?3, ?4)",
        )
        .bind(user_id)
        .bind(name)
        .bind(implement)
        .bind(create)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: Option<i64>, name: &str, implement: Option<NaiveDate>) -> TaskRowForm {
        TaskRowForm {
            id,
            name: name.to_string(),
            implement_date: implement,
            complete: false,
        }
    }

    #[tokio::test]
    async fn task_queries_return_only_the_requesters_tasks() {
        let db = test_db().await;
        let mine = seed_user(&db, "mine").await;
        let other = seed_user(&db, "other").await;
        let day = date(2024, 6, 3);
        seed_task(&db, mine, "write report", day, day).await;
        seed_task(&db, other, "their task", day, day).await;

        let today = implemented_on(&db, mine, day).await.unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].user_id, mine);

        let all = narrowed(&db, mine, None, None).await.unwrap();
        assert!(all.iter().all(|t| t.user_id == mine));

        let upcoming = after(&db, mine, date(2024, 6, 1)).await.unwrap();
        assert!(upcoming.iter().all(|t| t.user_id == mine));
    }

    #[tokio::test]
    async fn narrowing_filters_on_implement_date_not_create_date() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let inside = seed_task(&db, user, "inside", date(2024, 6, 10), date(2024, 1, 1)).await;
        seed_task(&db, user, "outside", date(2024, 7, 1), date(2024, 6, 10)).await;

        let hits = narrowed(&db, user, Some(date(2024, 6, 1)), Some(date(2024, 6, 30)))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, inside);
    }

    #[tokio::test]
    async fn after_is_strictly_later_than_the_given_day() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let day = date(2024, 6, 3);
        seed_task(&db, user, "today", day, day).await;
        let later = seed_task(&db, user, "tomorrow", date(2024, 6, 4), day).await;

        let upcoming = after(&db, user, day).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, later);
    }

    #[tokio::test]
    async fn narrowed_page_orders_by_implement_date_then_id() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        for day in (1..=6).rev() {
            seed_task(&db, user, &format!("task {}", day), date(2024, 6, day), date(2024, 6, 1))
                .await;
        }

        let (page, tasks) = narrowed_page(&db, user, None, None, 1).await.unwrap();
        assert_eq!(page.count, 6);
        assert_eq!(page.num_pages, 2);
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[0].name, "task 1");
        assert_eq!(tasks[4].name, "task 5");
    }

    #[tokio::test]
    async fn form_set_inserts_rows_without_an_id() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let today = date(2024, 6, 3);
        let form_set = TaskFormSet {
            tasks: vec![row(None, "new task", Some(date(2024, 6, 10)))],
        };

        let errors = apply_form_set(&db, user, &form_set, today).await.unwrap();
        assert!(errors.is_empty());

        let tasks = narrowed(&db, user, None, None).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "new task");
        assert_eq!(tasks[0].create_date, today);
    }

    #[tokio::test]
    async fn form_set_never_touches_a_foreign_task() {
        let db = test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let day = date(2024, 6, 3);
        let theirs = seed_task(&db, bob, "untouched", day, day).await;

        let form_set = TaskFormSet {
            tasks: vec![row(Some(theirs), "hijacked", Some(day))],
        };
        let errors = apply_form_set(&db, alice, &form_set, day).await.unwrap();
        assert!(errors.is_empty());

        let tasks = narrowed(&db, bob, None, None).await.unwrap();
        assert_eq!(tasks[0].name, "untouched");
        assert!(narrowed(&db, alice, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn form_set_skips_blank_spare_rows() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let form_set = TaskFormSet {
            tasks: vec![row(None, "", None)],
        };

        let errors = apply_form_set(&db, user, &form_set, date(2024, 6, 3)).await.unwrap();
        assert!(errors.is_empty());
        assert!(narrowed(&db, user, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn form_set_applies_valid_rows_and_reports_invalid_ones() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let day = date(2024, 6, 3);
        let form_set = TaskFormSet {
            tasks: vec![
                row(None, "good", Some(day)),
                row(None, "no date", None),
            ],
        };

        let errors = apply_form_set(&db, user, &form_set, day).await.unwrap();
        assert!(errors.contains("tasks[1].implement_date"));

        let tasks = narrowed(&db, user, None, None).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "good");
    }

    #[tokio::test]
    async fn form_set_updates_own_rows_in_place() {
        let db = test_db().await;
        let user = seed_user(&db, "alice").await;
        let day = date(2024, 6, 3);
        let task_id = seed_task(&db, user, "before", day, day).await;

        let mut edited = row(Some(task_id), "after", Some(date(2024, 6, 5)));
        edited.complete = true;
        let form_set = TaskFormSet { tasks: vec![edited] };
        let errors = apply_form_set(&db, user, &form_set, day).await.unwrap();
        assert!(errors.is_empty());

        let tasks = narrowed(&db, user, None, None).await.unwrap();
        assert_eq!(tasks[0].name, "after");
        assert!(tasks[0].complete);
        assert_eq!(tasks[0].implement_date, date(2024, 6, 5));
        assert_eq!(tasks[0].create_date, day);
    }
}
