//! Repository for the `settings` table.

use sqlx::PgPool;

use crate::models::setting::Setting;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "key, value, value_type, category, description, is_editable, \
    is_visible, created_at, updated_at";

/// Provides read and update operations for typed key/value settings.
pub struct SettingRepo;

impl SettingRepo {
    /// Find a setting by key.
    pub async fn find(pool: &PgPool, key: &str) -> Result<Option<Setting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE key = $1");
        sqlx::query_as::<_, Setting>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// List settings ordered by category then key. Hidden rows are only
    /// included when `include_hidden` is set.
    pub async fn list(pool: &PgPool, include_hidden: bool) -> Result<Vec<Setting>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM settings
             WHERE is_visible OR $1
             ORDER BY category ASC, key ASC"
        );
        sqlx::query_as::<_, Setting>(&query)
            .bind(include_hidden)
            .fetch_all(pool)
            .await
    }

    /// Replace the value of an existing setting.
    ///
    /// Returns `None` if no row with the given key exists.
    pub async fn update_value(
        pool: &PgPool,
        key: &str,
        value: &str,
    ) -> Result<Option<Setting>, sqlx::Error> {
        let query = format!(
            "UPDATE settings SET value = $2, updated_at = NOW()
             WHERE key = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Setting>(&query)
            .bind(key)
            .bind(value)
            .fetch_optional(pool)
            .await
    }
}
