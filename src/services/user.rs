use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::forms::{ProfileForm, RegisterForm};
use crate::models::User;

use super::contains_pattern;

const USER_COLUMNS: &str = "SELECT id, username, first_name, last_name, password_hash, is_admin, \
     created_at FROM users";

pub async fn get(db: &SqlitePool, user_id: i64) -> Result<User> {
    let sql = format!("{} WHERE id = ?1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("user"))
}

pub async fn by_username(db: &SqlitePool, username: &str) -> Result<Option<User>> {
    let sql = format!("{} WHERE username = ?1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(db)
        .await?)
}

/// The user directory, ordered by first name.
pub async fn directory(db: &SqlitePool) -> Result<Vec<User>> {
    let sql = format!("{} ORDER BY first_name, id", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).fetch_all(db).await?)
}

/// Single-keyword user search over username and both name fields.
pub async fn search(db: &SqlitePool, keyword: &str) -> Result<Vec<User>> {
    let sql = format!(
        "{} WHERE username LIKE ?1 ESCAPE '\\' OR first_name LIKE ?1 ESCAPE '\\' \
         OR last_name LIKE ?1 ESCAPE '\\' ORDER BY first_name, id",
        USER_COLUMNS
    );
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(contains_pattern(keyword))
        .fetch_all(db)
        .await?)
}

/// Inserts a new account. Returns `None` when the username is already taken.
pub async fn create(
    db: &SqlitePool,
    form: &RegisterForm,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    let done = sqlx::query(
        "INSERT INTO users (username, first_name, last_name, password_hash, is_admin, created_at) \
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
    )
    .bind(&form.username)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(password_hash)
    .bind(now)
    .execute(db)
    .await;

    match done {
        Ok(result) => Ok(Some(result.last_insert_rowid())),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_profile(db: &SqlitePool, user_id: i64, form: &ProfileForm) -> Result<()> {
    sqlx::query("UPDATE users SET first_name = ?1, last_name = ?2 WHERE id = ?3")
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Non-admin accounts for the admin panel, optionally filtered by username.
pub async fn admin_list(db: &SqlitePool, keyword: Option<&str>) -> Result<Vec<User>> {
    match keyword {
        Some(keyword) if !keyword.trim().is_empty() => {
            let sql = format!(
                "{} WHERE is_admin = 0 AND username LIKE ?1 ESCAPE '\\' ORDER BY username",
                USER_COLUMNS
            );
            Ok(sqlx::query_as::<_, User>(&sql)
                .bind(contains_pattern(keyword.trim()))
                .fetch_all(db)
                .await?)
        }
        _ => {
            let sql = format!("{} WHERE is_admin = 0 ORDER BY username", USER_COLUMNS);
            Ok(sqlx::query_as::<_, User>(&sql).fetch_all(db).await?)
        }
    }
}

/// Username of the account an admin is about to delete, for the retype
/// confirmation. Admin rows never match, so they cannot be deleted this way.
pub async fn deletable_username(db: &SqlitePool, user_id: i64) -> Result<Option<String>> {
    let username: Option<String> =
        sqlx::query_scalar("SELECT username FROM users WHERE id = ?1 AND is_admin = 0")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(username)
}

pub async fn admin_exists(db: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn create_admin(
    db: &SqlitePool,
    username: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO users (username, first_name, last_name, password_hash, is_admin, created_at) \
         VALUES (?1, '', '', ?2, 1, ?3)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(now)
    .execute(db)
    .await?;
    Ok(done.last_insert_rowid())
}

/// Removes a user together with their dailies, comments, and tasks.
pub async fn delete(db: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> SqlitePool {
        let db = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&db).await.unwrap();
        db
    }

    fn register(username: &str, first: &str, last: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..RegisterForm::default()
        }
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected_without_an_error() {
        let db = test_db().await;
        let first = create(&db, &register("alice", "Alice", "Arai"), "h", Utc::now())
            .await
            .unwrap();
        assert!(first.is_some());

        let second = create(&db, &register("alice", "Other", "Person"), "h", Utc::now())
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn directory_is_ordered_by_first_name() {
        let db = test_db().await;
        create(&db, &register("u1", "Chika", "Sato"), "h", Utc::now()).await.unwrap();
        create(&db, &register("u2", "Alice", "Arai"), "h", Utc::now()).await.unwrap();
        create(&db, &register("u3", "Ben", "Okada"), "h", Utc::now()).await.unwrap();

        let users = directory(&db).await.unwrap();
        let firsts: Vec<&str> = users.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(firsts, ["Alice", "Ben", "Chika"]);
    }

    #[tokio::test]
    async fn search_matches_username_or_either_name() {
        let db = test_db().await;
        create(&db, &register("grizzly", "Alice", "Arai"), "h", Utc::now()).await.unwrap();
        create(&db, &register("u2", "Grace", "Bear"), "h", Utc::now()).await.unwrap();
        create(&db, &register("u3", "Chika", "Sato"), "h", Utc::now()).await.unwrap();

        let hits = search(&db, "ar").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|u| u.username.as_str()).collect();
        assert!(names.contains(&"grizzly"));
        assert!(names.contains(&"u2"));
        assert!(!names.contains(&"u3"));
    }

    #[tokio::test]
    async fn admin_list_excludes_admins_and_filters_by_username() {
        let db = test_db().await;
        create(&db, &register("carol", "C", "C"), "h", Utc::now()).await.unwrap();
        create(&db, &register("carlos", "C", "C"), "h", Utc::now()).await.unwrap();
        create_admin(&db, "admin", "h", Utc::now()).await.unwrap();

        let all = admin_list(&db, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["carlos", "carol"]);

        let filtered = admin_list(&db, Some("los")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username, "carlos");
    }

    #[tokio::test]
    async fn deletable_username_skips_admins_and_missing_ids() {
        let db = test_db().await;
        let carol = create(&db, &register("carol", "C", "C"), "h", Utc::now())
            .await
            .unwrap()
            .unwrap();
        let admin = create_admin(&db, "admin", "h", Utc::now()).await.unwrap();

        assert_eq!(
            deletable_username(&db, carol).await.unwrap().as_deref(),
            Some("carol")
        );
        assert_eq!(deletable_username(&db, admin).await.unwrap(), None);
        assert_eq!(deletable_username(&db, 999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_their_records() {
        let db = test_db().await;
        let user_id = create(&db, &register("alice", "A", "A"), "h", Utc::now())
            .await
            .unwrap()
            .unwrap();
        sqlx::query(
            "INSERT INTO tasks (user_id, name, complete, implement_date, create_date) \
             VALUES (?1, 't', 0, '2024-06-03', '2024-06-03')",
        )
        .bind(user_id)
        .execute(&db)
        .await
        .unwrap();

        delete(&db, user_id).await.unwrap();
        assert!(matches!(get(&db, user_id).await, Err(AppError::NotFound("user"))));
        let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(tasks, 0);
    }
}
