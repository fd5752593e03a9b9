use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

use crate::core::review_form::{ReviewFormError, ReviewStore};

pub struct SqliteReviewStore {
    pool: Pool<Sqlite>,
}

impl SqliteReviewStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid INTEGER NOT NULL,
                paper_id INTEGER NOT NULL,
                created TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reviews_uid_paper ON reviews (uid, paper_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a review, as the host's form submission would.
    pub async fn add_review(&self, uid: u64, paper_id: u64) -> Result<u64, ReviewFormError> {
        let result = sqlx::query("INSERT INTO reviews (uid, paper_id, created) VALUES (?, ?, ?)")
            .bind(uid as i64)
            .bind(paper_id as i64)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| ReviewFormError::Storage(e.to_string()))?;

        Ok(result.last_insert_rowid() as u64)
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn count_by_author(&self, uid: u64, paper_id: u64) -> Result<u64, ReviewFormError> {
        let row = sqlx::query("SELECT COUNT(*) FROM reviews WHERE uid = ? AND paper_id = ?")
            .bind(uid as i64)
            .bind(paper_id as i64)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ReviewFormError::Storage(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, SqliteReviewStore) {
        let dir = TempDir::new().expect("temp dir");
        let db_path = dir.path().join("reviews.db");
        let store = SqliteReviewStore::new(db_path.to_str().unwrap())
            .await
            .expect("sqlite store");
        (dir, store)
    }

    #[tokio::test]
    async fn count_is_scoped_to_author_and_paper() {
        let (_dir, store) = temp_store().await;

        store.add_review(1, 10).await.unwrap();
        store.add_review(1, 10).await.unwrap();
        store.add_review(2, 10).await.unwrap();

        assert_eq!(store.count_by_author(1, 10).await.unwrap(), 2);
        assert_eq!(store.count_by_author(2, 10).await.unwrap(), 1);
        assert_eq!(store.count_by_author(1, 11).await.unwrap(), 0);
    }
}
