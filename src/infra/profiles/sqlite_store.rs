use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

use crate::core::profile_sync::{PhotoField, Profile, ProfileStore, ProfileSyncError};

pub struct SqliteProfileStore {
    pool: Pool<Sqlite>,
}

impl SqliteProfileStore {
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
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid INTEGER NOT NULL,
                status INTEGER NOT NULL DEFAULT 1,
                first_name TEXT,
                last_name TEXT,
                full_name TEXT,
                email TEXT,
                provider_id TEXT,
                phone TEXT,
                photo_file_id INTEGER,
                photo_alt TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_uid ON profiles (uid, status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Profile {
        let photo_file_id: Option<i64> = row.get("photo_file_id");
        let photo_alt: Option<String> = row.get("photo_alt");
        let photo = photo_file_id.map(|file_id| PhotoField {
            file_id: file_id as u64,
            alt: photo_alt.unwrap_or_default(),
        });

        Profile {
            id: Some(row.get::<i64, _>("id") as u64),
            uid: row.get::<i64, _>("uid") as u64,
            active: row.get::<i64, _>("status") != 0,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            provider_id: row.get("provider_id"),
            phone: row.get("phone"),
            photo,
        }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn find_active(&self, uid: u64) -> Result<Option<Profile>, ProfileSyncError> {
        let row = sqlx::query(
            "SELECT id, uid, status, first_name, last_name, full_name, email, provider_id, \
             phone, photo_file_id, photo_alt \
             FROM profiles WHERE uid = ? AND status = 1 ORDER BY id ASC LIMIT 1",
        )
        .bind(uid as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProfileSyncError::Storage(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_profile))
    }

    async fn save(&self, profile: &Profile) -> Result<u64, ProfileSyncError> {
        let (photo_file_id, photo_alt) = match &profile.photo {
            Some(photo) => (Some(photo.file_id as i64), Some(photo.alt.clone())),
            None => (None, None),
        };

        if let Some(id) = profile.id {
            sqlx::query(
                r#"
                UPDATE profiles SET
                    uid = ?, status = ?, first_name = ?, last_name = ?, full_name = ?,
                    email = ?, provider_id = ?, phone = ?, photo_file_id = ?, photo_alt = ?
                WHERE id = ?
                "#,
            )
            .bind(profile.uid as i64)
            .bind(profile.active as i64)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.full_name)
            .bind(&profile.email)
            .bind(&profile.provider_id)
            .bind(&profile.phone)
            .bind(photo_file_id)
            .bind(&photo_alt)
            .bind(id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| ProfileSyncError::Storage(e.to_string()))?;

            Ok(id)
        } else {
            let result = sqlx::query(
                r#"
                INSERT INTO profiles
                    (uid, status, first_name, last_name, full_name, email, provider_id,
                     phone, photo_file_id, photo_alt)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(profile.uid as i64)
            .bind(profile.active as i64)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.full_name)
            .bind(&profile.email)
            .bind(&profile.provider_id)
            .bind(&profile.phone)
            .bind(photo_file_id)
            .bind(&photo_alt)
            .execute(&self.pool)
            .await
            .map_err(|e| ProfileSyncError::Storage(e.to_string()))?;

            Ok(result.last_insert_rowid() as u64)
        }
    }
}
