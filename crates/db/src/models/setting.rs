//! Setting model and DTOs.

use bayline_core::settings::SettingType;
use bayline_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[sqlx(try_from = "String")]
    pub value_type: SettingType,
    pub category: String,
    pub description: Option<String>,
    pub is_editable: bool,
    pub is_visible: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for PUT /admin/settings/{key}.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSetting {
    pub value: String,
}
