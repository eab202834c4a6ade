//! Store traits the queue services program against.
//!
//! Each trait is object safe and used as `Arc<dyn …>`. [`PgStore`] backs
//! them with the Postgres repositories; [`MemoryStore`] keeps everything in
//! process for tests and single-node demos. Both implement ticket allocation
//! as one atomic step (count active, compute next number, insert).

use std::sync::Arc;

use async_trait::async_trait;
use bayline_core::maintenance::{CostSummary, ItemStatus, ItemType};
use bayline_core::ticket::TicketStatus;
use bayline_core::types::{DbId, ServiceDate, Timestamp};

use crate::models::identity::{User, Vehicle};
use crate::models::maintenance_item::{CreateMaintenanceItem, MaintenanceItem};
use crate::models::setting::Setting;
use crate::models::ticket::{CreateTicket, Ticket};
use crate::repositories::Allocation;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A unique constraint rejected the write. Holds the constraint name.
    #[error("Duplicate value violates unique constraint: {0}")]
    Conflict(String),

    /// Non-database backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.starts_with("uq_") {
                        return StoreError::Conflict(constraint.to_string());
                    }
                }
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Atomically allocate the next queue number for the ticket's date and
    /// insert it as `waiting`, unless the date is at `max_per_day`.
    async fn create_numbered(
        &self,
        input: &CreateTicket,
        max_per_day: i64,
    ) -> StoreResult<Allocation>;

    async fn next_queue_number(&self, date: ServiceDate) -> StoreResult<i32>;

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Ticket>>;

    async fn find_by_queue_number(
        &self,
        date: ServiceDate,
        queue_number: i32,
    ) -> StoreResult<Option<Ticket>>;

    /// All tickets for a date, ordered by queue number.
    async fn list_by_date(&self, date: ServiceDate) -> StoreResult<Vec<Ticket>>;

    async fn list_by_customer(&self, customer_id: DbId) -> StoreResult<Vec<Ticket>>;

    /// Tickets in `status` with a service date strictly before `cutoff`.
    async fn list_by_status_before(
        &self,
        status: TicketStatus,
        cutoff: ServiceDate,
    ) -> StoreResult<Vec<Ticket>>;

    /// Full overwrite of the mutable columns. `None` if the ticket is gone.
    async fn update(&self, ticket: &Ticket) -> StoreResult<Option<Ticket>>;

    /// Hard delete, cascading to the ticket's maintenance items.
    async fn delete(&self, id: DbId) -> StoreResult<bool>;
}

#[async_trait]
pub trait MaintenanceItemStore: Send + Sync {
    async fn create(&self, input: &CreateMaintenanceItem) -> StoreResult<MaintenanceItem>;

    /// All-or-nothing insert.
    async fn create_batch(
        &self,
        inputs: &[CreateMaintenanceItem],
    ) -> StoreResult<Vec<MaintenanceItem>>;

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<MaintenanceItem>>;

    async fn list_by_ticket(&self, ticket_id: DbId) -> StoreResult<Vec<MaintenanceItem>>;

    async fn list_by_ticket_and_status(
        &self,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> StoreResult<Vec<MaintenanceItem>>;

    async fn list_by_ticket_and_type(
        &self,
        ticket_id: DbId,
        item_type: ItemType,
    ) -> StoreResult<Vec<MaintenanceItem>>;

    /// Write `item` only if the stored row is still in `expected` status.
    /// `None` means the row is gone or its status changed underneath.
    async fn update(
        &self,
        item: &MaintenanceItem,
        expected: ItemStatus,
    ) -> StoreResult<Option<MaintenanceItem>>;

    /// Move every id in `ids` from `from` to `status` in one write. All rows
    /// change or none do; returns rows touched (0 on a mismatch).
    async fn set_status_batch(
        &self,
        ids: &[DbId],
        from: ItemStatus,
        status: ItemStatus,
        approved_at: Option<Timestamp>,
    ) -> StoreResult<u64>;

    /// Totals over items that are neither rejected nor skipped.
    async fn total_cost(&self, ticket_id: DbId) -> StoreResult<CostSummary>;

    async fn count_by_status(&self, ticket_id: DbId, status: ItemStatus) -> StoreResult<i64>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Setting>>;

    async fn list(&self, include_hidden: bool) -> StoreResult<Vec<Setting>>;

    async fn update_value(&self, key: &str, value: &str) -> StoreResult<Option<Setting>>;
}

/// Existence lookups for users and vehicles owned by another service.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn find_vehicle(&self, id: DbId) -> StoreResult<Option<Vehicle>>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// One handle per store trait, all pointing at the same backend.
#[derive(Clone)]
pub struct Stores {
    pub tickets: Arc<dyn TicketStore>,
    pub items: Arc<dyn MaintenanceItemStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub identity: Arc<dyn IdentityStore>,
}

impl Stores {
    pub fn postgres(pool: crate::DbPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self::from_backend(store)
    }

    fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: TicketStore + MaintenanceItemStore + SettingsStore + IdentityStore + 'static,
    {
        Self {
            tickets: backend.clone(),
            items: backend.clone(),
            settings: backend.clone(),
            identity: backend,
        }
    }
}
