use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Task;
use crate::services::task;

/// Task panels rendered beside the report pages: the tasks scheduled for
/// today and the ones coming up after it.
#[derive(Debug, Serialize)]
pub struct TaskWidgets {
    pub task_form: Vec<Task>,
    pub task_form_next: Vec<Task>,
}

/// Builds the widgets for one user. Every page that shows the panels goes
/// through here so the two queries stay in one place.
pub async fn task_widgets(db: &SqlitePool, user_id: i64, today: NaiveDate) -> Result<TaskWidgets> {
    Ok(TaskWidgets {
        task_form: task::implemented_on(db, user_id, today).await?,
        task_form_next: task::after(db, user_id, today).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn widgets_split_todays_tasks_from_upcoming_ones() {
        let db = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&db).await.unwrap();
        let user_id = sqlx::query(
            "INSERT INTO users (username, first_name, last_name, password_hash, is_admin, created_at) \
             VALUES ('alice', 'f', 'l', 'x', 0, ?1)",
        )
        .bind(Utc::now())
        .execute(&db)
        .await
        .unwrap()
        .last_insert_rowid();

        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        for (name, implement) in [("now", today), ("later", today.succ_opt().unwrap())] {
            sqlx::query(
                "INSERT INTO tasks (user_id, name, complete, implement_date, create_date) \
                 VALUES (?1, ?2, 0, ?3, ?4)",
            )
            .bind(user_id)
            .bind(name)
            .bind(implement)
            .bind(today)
            .execute(&db)
            .await
            .unwrap();
        }

        let widgets = task_widgets(&db, user_id, today).await.unwrap();
        assert_eq!(widgets.task_form.len(), 1);
        assert_eq!(widgets.task_form[0].name, "now");
        assert_eq!(widgets.task_form_next.len(), 1);
        assert_eq!(widgets.task_form_next[0].name, "later");
    }
}
