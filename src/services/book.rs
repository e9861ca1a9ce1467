use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::forms::BookForm;
use crate::models::{Book, Impression};

pub async fn list(db: &SqlitePool) -> Result<Vec<Book>> {
    Ok(
        sqlx::query_as::<_, Book>("SELECT id, name, publisher, page FROM books ORDER BY id DESC")
            .fetch_all(db)
            .await?,
    )
}

pub async fn get(db: &SqlitePool, book_id: i64) -> Result<Book> {
    sqlx::query_as::<_, Book>("SELECT id, name, publisher, page FROM books WHERE id = ?1")
        .bind(book_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("book"))
}

pub async fn insert(db: &SqlitePool, form: &BookForm) -> Result<i64> {
    let done = sqlx::query("INSERT INTO books (name, publisher, page) VALUES (?1, ?2, ?3)")
        .bind(&form.name)
        .bind(&form.publisher)
        .bind(form.page)
        .execute(db)
        .await?;
    Ok(done.last_insert_rowid())
}

pub async fn update(db: &SqlitePool, book_id: i64, form: &BookForm) -> Result<()> {
    sqlx::query("UPDATE books SET name = ?1, publisher = ?2, page = ?3 WHERE id = ?4")
        .bind(&form.name)
        .bind(&form.publisher)
        .bind(form.page)
        .bind(book_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, book_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM books WHERE id = ?1")
        .bind(book_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn impressions_for(db: &SqlitePool, book_id: i64) -> Result<Vec<Impression>> {
    Ok(sqlx::query_as::<_, Impression>(
        "SELECT id, book_id, comment FROM impressions WHERE book_id = ?1 ORDER BY id",
    )
    .bind(book_id)
    .fetch_all(db)
    .await?)
}

pub async fn get_impression(db: &SqlitePool, impression_id: i64) -> Result<Impression> {
    sqlx::query_as::<_, Impression>(
        "SELECT id, book_id, comment FROM impressions WHERE id = ?1",
    )
    .bind(impression_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("impression"))
}

pub async fn insert_impression(db: &SqlitePool, book_id: i64, comment: &str) -> Result<i64> {
    let done = sqlx::query("INSERT INTO impressions (book_id, comment) VALUES (?1, ?2)")
        .bind(book_id)
        .bind(comment)
        .execute(db)
        .await?;
    Ok(done.last_insert_rowid())
}

pub async fn update_impression(db: &SqlitePool, impression_id: i64, comment: &str) -> Result<()> {
    sqlx::query("UPDATE impressions SET comment = ?1 WHERE id = ?2")
        .bind(comment)
        .bind(impression_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_impression(db: &SqlitePool, impression_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM impressions WHERE id = ?1")
        .bind(impression_id)
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

    fn book(name: &str) -> BookForm {
        BookForm {
            name: name.to_string(),
            publisher: "pub".to_string(),
            page: Some(200),
        }
    }

    #[tokio::test]
    async fn books_list_newest_first() {
        let db = test_db().await;
        insert(&db, &book("first")).await.unwrap();
        insert(&db, &book("second")).await.unwrap();

        let books = list(&db).await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].name, "second");
    }

    #[tokio::test]
    async fn deleting_a_book_cascades_its_impressions() {
        let db = test_db().await;
        let book_id = insert(&db, &book("doomed")).await.unwrap();
        let impression_id = insert_impression(&db, book_id, "liked it").await.unwrap();

        delete(&db, book_id).await.unwrap();
        assert!(matches!(
            get_impression(&db, impression_id).await,
            Err(AppError::NotFound("impression"))
        ));
    }

    #[tokio::test]
    async fn impression_update_round_trip() {
        let db = test_db().await;
        let book_id = insert(&db, &book("kept")).await.unwrap();
        let impression_id = insert_impression(&db, book_id, "first pass").await.unwrap();

        update_impression(&db, impression_id, "second pass").await.unwrap();
        let impressions = impressions_for(&db, book_id).await.unwrap();
        assert_eq!(impressions.len(), 1);
        assert_eq!(impressions[0].comment, "second pass");
    }
}
