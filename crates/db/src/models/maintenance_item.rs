//! Maintenance item model and DTOs.

use bayline_core::maintenance::{ItemPriority, ItemStatus, ItemType};
use bayline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `maintenance_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceItem {
    pub id: DbId,
    pub ticket_id: DbId,
    pub mechanic_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub item_type: ItemType,
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub priority: ItemPriority,
    pub estimated_cost: f64,
    pub actual_cost: Option<f64>,
    pub labor_hours: Option<f64>,
    pub requires_approval: bool,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub inspected_at: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fully stamped insert record. Built by the maintenance manager from one of
/// the request DTOs below.
#[derive(Debug, Clone)]
pub struct CreateMaintenanceItem {
    pub ticket_id: DbId,
    pub mechanic_id: Option<DbId>,
    pub item_type: ItemType,
    pub status: ItemStatus,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub priority: ItemPriority,
    pub estimated_cost: f64,
    pub labor_hours: Option<f64>,
    pub requires_approval: bool,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub inspected_at: Option<Timestamp>,
}

/// One pre-agreed item supplied when a ticket is opened for service.
#[derive(Debug, Clone, Deserialize)]
pub struct InitialItemInput {
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: ItemPriority,
    #[serde(default)]
    pub estimated_cost: f64,
    pub labor_hours: Option<f64>,
    pub notes: Option<String>,
}

/// Request body for POST /maintenance-items/discovered.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveredItemInput {
    pub ticket_id: DbId,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: ItemPriority,
    #[serde(default)]
    pub estimated_cost: f64,
    pub labor_hours: Option<f64>,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

fn default_requires_approval() -> bool {
    true
}

/// Request body for POST /maintenance-items/approve.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveItemsRequest {
    pub item_ids: Vec<DbId>,
    pub approve: bool,
}

/// Request body for POST /maintenance-items/{id}/complete.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteItemRequest {
    pub actual_cost: f64,
}

/// Query parameters for listing a ticket's items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemListParams {
    pub status: Option<ItemStatus>,
    pub item_type: Option<ItemType>,
}
