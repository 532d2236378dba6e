//! Settings database operations
//!
//! Key/value accessors for the `settings` table.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Taste profile API key stored from the command line
pub const TASTE_API_KEY: &str = "taste_api_key";

/// Cached identifier of the taste profile used for sync
pub const TASTE_PROFILE_ID: &str = "taste_profile_id";

pub async fn get_taste_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, TASTE_API_KEY).await
}

pub async fn set_taste_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, TASTE_API_KEY, key).await
}

pub async fn get_taste_profile_id(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, TASTE_PROFILE_ID).await
}

pub async fn set_taste_profile_id(db: &Pool<Sqlite>, profile_id: String) -> Result<()> {
    set_setting(db, TASTE_PROFILE_ID, profile_id).await
}

/// Forget the cached profile id (after the profile is deleted remotely)
pub async fn clear_taste_profile_id(db: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(TASTE_PROFILE_ID)
        .execute(db)
        .await?;
    Ok(())
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;

    #[tokio::test]
    async fn test_profile_id_roundtrip_and_clear() {
        let pool = memory_database().await.unwrap();
        assert!(get_taste_profile_id(&pool).await.unwrap().is_none());

        set_taste_profile_id(&pool, "CAABCD".to_string()).await.unwrap();
        set_taste_profile_id(&pool, "CAWXYZ".to_string()).await.unwrap();
        assert_eq!(get_taste_profile_id(&pool).await.unwrap().as_deref(), Some("CAWXYZ"));

        clear_taste_profile_id(&pool).await.unwrap();
        assert!(get_taste_profile_id(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unparseable_setting() {
        let pool = memory_database().await.unwrap();
        set_setting(&pool, "page_size", "twenty").await.unwrap();

        let result = get_setting::<usize>(&pool, "page_size").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
