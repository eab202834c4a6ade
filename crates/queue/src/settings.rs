//! Typed access to the `settings` table with a short-lived read cache.
//!
//! Reads go through a per-key cache whose entries expire after the
//! configured TTL. Writes made through [`SettingsProvider::update`] drop the
//! key from the cache so the new value is visible immediately in this
//! process. Missing keys and values that do not parse fall back to the
//! caller's default.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bayline_core::error::CoreError;
use bayline_core::schedule::DailySchedule;
use bayline_core::settings::{
    parse_bool, parse_float, parse_int, validate_setting_value, DEFAULT_CLEANUP_ENABLED,
    DEFAULT_CLEANUP_RETENTION_DAYS, DEFAULT_CLEANUP_SCHEDULE, DEFAULT_MAX_TICKETS_PER_DAY,
    KEY_CLEANUP_ENABLED, KEY_CLEANUP_RETENTION_DAYS, KEY_CLEANUP_SCHEDULE,
    KEY_MAX_TICKETS_PER_DAY,
};
use bayline_db::models::setting::Setting;
use bayline_db::store::SettingsStore;
use tokio::sync::RwLock;

use crate::error::{ServiceResult, StoreContext};

/// Default cache lifetime for setting values.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedValue {
    value: Option<String>,
    fetched_at: Instant,
}

pub struct SettingsProvider {
    store: Arc<dyn SettingsStore>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedValue>>,
}

impl SettingsProvider {
    pub fn new(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Raw string value for `key`, or `None` when the key is not set.
    pub async fn raw(&self, key: &str) -> ServiceResult<Option<String>> {
        if !self.ttl.is_zero() {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.value.clone());
                }
            }
        }

        let value = self
            .store
            .get(key)
            .await
            .context(|| format!("load setting {key}"))?
            .map(|s| s.value);

        if !self.ttl.is_zero() {
            self.cache.write().await.insert(
                key.to_string(),
                CachedValue {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(value)
    }

    pub async fn get_int(&self, key: &str, default: i64) -> ServiceResult<i64> {
        self.typed(key, default, parse_int).await
    }

    pub async fn get_float(&self, key: &str, default: f64) -> ServiceResult<f64> {
        self.typed(key, default, parse_float).await
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> ServiceResult<bool> {
        self.typed(key, default, parse_bool).await
    }

    pub async fn get_string(&self, key: &str, default: &str) -> ServiceResult<String> {
        Ok(self
            .raw(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    async fn typed<T, F>(&self, key: &str, default: T, parse: F) -> ServiceResult<T>
    where
        T: std::fmt::Debug,
        F: Fn(&str) -> Option<T>,
    {
        let Some(raw) = self.raw(key).await? else {
            return Ok(default);
        };
        match parse(&raw) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(key, value = %raw, ?default, "Unparseable setting, using default");
                Ok(default)
            }
        }
    }

    // -- Queue settings -----------------------------------------------------

    pub async fn max_tickets_per_day(&self) -> ServiceResult<i64> {
        self.get_int(KEY_MAX_TICKETS_PER_DAY, DEFAULT_MAX_TICKETS_PER_DAY)
            .await
    }

    pub async fn retention_days(&self) -> ServiceResult<i64> {
        self.get_int(KEY_CLEANUP_RETENTION_DAYS, DEFAULT_CLEANUP_RETENTION_DAYS)
            .await
    }

    pub async fn cleanup_enabled(&self) -> ServiceResult<bool> {
        self.get_bool(KEY_CLEANUP_ENABLED, DEFAULT_CLEANUP_ENABLED)
            .await
    }

    /// The enforcement schedule. An unparseable value falls back to midnight.
    pub async fn cleanup_schedule(&self) -> ServiceResult<DailySchedule> {
        let raw = self
            .get_string(KEY_CLEANUP_SCHEDULE, DEFAULT_CLEANUP_SCHEDULE)
            .await?;
        Ok(DailySchedule::parse(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid cleanup schedule, using midnight");
            DailySchedule::MIDNIGHT
        }))
    }

    // -- Administration -----------------------------------------------------

    pub async fn list(&self, include_hidden: bool) -> ServiceResult<Vec<Setting>> {
        self.store
            .list(include_hidden)
            .await
            .context(|| "list settings".to_string())
    }

    pub async fn get_setting(&self, key: &str) -> ServiceResult<Setting> {
        self.store
            .get(key)
            .await
            .context(|| format!("load setting {key}"))?
            .ok_or_else(|| not_found(key).into())
    }

    /// Change a setting's value.
    ///
    /// Rejects keys marked non-editable and values that do not parse as the
    /// declared type or fall outside the key's range.
    pub async fn update(&self, key: &str, value: &str) -> ServiceResult<Setting> {
        let current = self.get_setting(key).await?;
        if !current.is_editable {
            return Err(CoreError::Forbidden(format!("Setting '{key}' is not editable")).into());
        }
        validate_setting_value(key, current.value_type, value)?;

        let updated = self
            .store
            .update_value(key, value)
            .await
            .context(|| format!("update setting {key}"))?
            .ok_or_else(|| not_found(key))?;

        self.invalidate(key).await;
        tracing::info!(key, old = %current.value, new = %updated.value, "Setting updated");
        Ok(updated)
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.write().await.remove(key);
    }

    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }
}

fn not_found(key: &str) -> CoreError {
    CoreError::KeyNotFound {
        entity: "setting",
        key: key.to_string(),
    }
}
