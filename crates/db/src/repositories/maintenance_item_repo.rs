//! Repository for the `maintenance_items` table.

use bayline_core::maintenance::{CostSummary, ItemStatus, ItemType};
use bayline_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::maintenance_item::{CreateMaintenanceItem, MaintenanceItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, ticket_id, mechanic_id, item_type, status, category, name, \
    description, priority, estimated_cost, actual_cost, labor_hours, requires_approval, \
    image_url, notes, inspected_at, approved_at, completed_at, created_at, updated_at";

const INSERT: &str = "INSERT INTO maintenance_items
        (ticket_id, mechanic_id, item_type, status, category, name, description, priority,
         estimated_cost, labor_hours, requires_approval, image_url, notes, inspected_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)";

/// Provides CRUD and aggregate operations for maintenance items.
pub struct MaintenanceItemRepo;

impl MaintenanceItemRepo {
    /// Insert one item, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMaintenanceItem,
    ) -> Result<MaintenanceItem, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        bind_insert(sqlx::query_as::<_, MaintenanceItem>(&query), input)
            .fetch_one(pool)
            .await
    }

    /// Insert several items in one transaction. Either all rows are created
    /// or none are.
    pub async fn create_batch(
        pool: &PgPool,
        inputs: &[CreateMaintenanceItem],
    ) -> Result<Vec<MaintenanceItem>, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let item = bind_insert(sqlx::query_as::<_, MaintenanceItem>(&query), input)
                .fetch_one(&mut *tx)
                .await?;
            created.push(item);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Find an item by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MaintenanceItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maintenance_items WHERE id = $1");
        sqlx::query_as::<_, MaintenanceItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all items for a ticket in creation order.
    pub async fn list_by_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<MaintenanceItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_items WHERE ticket_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, MaintenanceItem>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }

    /// List a ticket's items in one status.
    pub async fn list_by_ticket_and_status(
        pool: &PgPool,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> Result<Vec<MaintenanceItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_items
             WHERE ticket_id = $1 AND status = $2 ORDER BY id ASC"
        );
        sqlx::query_as::<_, MaintenanceItem>(&query)
            .bind(ticket_id)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// List a ticket's items of one type.
    pub async fn list_by_ticket_and_type(
        pool: &PgPool,
        ticket_id: DbId,
        item_type: ItemType,
    ) -> Result<Vec<MaintenanceItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_items
             WHERE ticket_id = $1 AND item_type = $2 ORDER BY id ASC"
        );
        sqlx::query_as::<_, MaintenanceItem>(&query)
            .bind(ticket_id)
            .bind(item_type.as_str())
            .fetch_all(pool)
            .await
    }

    /// Overwrite every mutable column, provided the row is still in
    /// `expected` status. Returns `None` when the row is missing or has moved
    /// on. `ticket_id` and `item_type` never change.
    pub async fn update(
        pool: &PgPool,
        item: &MaintenanceItem,
        expected: ItemStatus,
    ) -> Result<Option<MaintenanceItem>, sqlx::Error> {
        let query = format!(
            "UPDATE maintenance_items SET
                mechanic_id = $2,
                status = $3,
                category = $4,
                name = $5,
                description = $6,
                priority = $7,
                estimated_cost = $8,
                actual_cost = $9,
                labor_hours = $10,
                requires_approval = $11,
                image_url = $12,
                notes = $13,
                inspected_at = $14,
                approved_at = $15,
                completed_at = $16,
                updated_at = NOW()
             WHERE id = $1 AND status = $17
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MaintenanceItem>(&query)
            .bind(item.id)
            .bind(item.mechanic_id)
            .bind(item.status.as_str())
            .bind(&item.category)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.priority.as_str())
            .bind(item.estimated_cost)
            .bind(item.actual_cost)
            .bind(item.labor_hours)
            .bind(item.requires_approval)
            .bind(&item.image_url)
            .bind(&item.notes)
            .bind(item.inspected_at)
            .bind(item.approved_at)
            .bind(item.completed_at)
            .bind(expected.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move every id from `from` to `status` in one transaction. If any row
    /// is missing or no longer in `from`, nothing changes and 0 is returned.
    /// `approved_at` is only overwritten when provided.
    pub async fn set_status_batch(
        pool: &PgPool,
        ids: &[DbId],
        from: ItemStatus,
        status: ItemStatus,
        approved_at: Option<Timestamp>,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            "UPDATE maintenance_items
             SET status = $2, approved_at = COALESCE($3, approved_at), updated_at = NOW()
             WHERE id = ANY($1) AND status = $4",
        )
        .bind(ids)
        .bind(status.as_str())
        .bind(approved_at)
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != ids.len() as u64 {
            tx.rollback().await?;
            return Ok(0);
        }
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Sum estimated and actual cost for a ticket, excluding rejected and
    /// skipped items.
    pub async fn total_cost(pool: &PgPool, ticket_id: DbId) -> Result<CostSummary, sqlx::Error> {
        let (total_estimated, total_actual): (f64, f64) = sqlx::query_as(
            "SELECT
                COALESCE(SUM(estimated_cost), 0)::DOUBLE PRECISION,
                COALESCE(SUM(actual_cost), 0)::DOUBLE PRECISION
             FROM maintenance_items
             WHERE ticket_id = $1 AND status NOT IN ($2, $3)",
        )
        .bind(ticket_id)
        .bind(ItemStatus::Rejected.as_str())
        .bind(ItemStatus::Skipped.as_str())
        .fetch_one(pool)
        .await?;

        Ok(CostSummary {
            total_estimated,
            total_actual,
        })
    }

    /// Count a ticket's items in one status.
    pub async fn count_by_status(
        pool: &PgPool,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM maintenance_items WHERE ticket_id = $1 AND status = $2",
        )
        .bind(ticket_id)
        .bind(status.as_str())
        .fetch_one(pool)
        .await
    }
}

fn bind_insert<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, MaintenanceItem, sqlx::postgres::PgArguments>,
    input: &'q CreateMaintenanceItem,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, MaintenanceItem, sqlx::postgres::PgArguments> {
    query
        .bind(input.ticket_id)
        .bind(input.mechanic_id)
        .bind(input.item_type.as_str())
        .bind(input.status.as_str())
        .bind(&input.category)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.priority.as_str())
        .bind(input.estimated_cost)
        .bind(input.labor_hours)
        .bind(input.requires_approval)
        .bind(&input.image_url)
        .bind(&input.notes)
        .bind(input.inspected_at)
}
