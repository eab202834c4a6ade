//! Postgres-backed store, delegating to the repositories.

use async_trait::async_trait;
use bayline_core::maintenance::{CostSummary, ItemStatus, ItemType};
use bayline_core::ticket::TicketStatus;
use bayline_core::types::{DbId, ServiceDate, Timestamp};

use super::{
    IdentityStore, MaintenanceItemStore, SettingsStore, StoreResult, TicketStore,
};
use crate::models::identity::{User, Vehicle};
use crate::models::maintenance_item::{CreateMaintenanceItem, MaintenanceItem};
use crate::models::setting::Setting;
use crate::models::ticket::{CreateTicket, Ticket};
use crate::repositories::{
    Allocation, MaintenanceItemRepo, SettingRepo, TicketRepo, UserRepo, VehicleRepo,
};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn create_numbered(
        &self,
        input: &CreateTicket,
        max_per_day: i64,
    ) -> StoreResult<Allocation> {
        Ok(TicketRepo::create_numbered(&self.pool, input, max_per_day).await?)
    }

    async fn next_queue_number(&self, date: ServiceDate) -> StoreResult<i32> {
        Ok(TicketRepo::next_queue_number(&self.pool, date).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Ticket>> {
        Ok(TicketRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_queue_number(
        &self,
        date: ServiceDate,
        queue_number: i32,
    ) -> StoreResult<Option<Ticket>> {
        Ok(TicketRepo::find_by_queue_number(&self.pool, date, queue_number).await?)
    }

    async fn list_by_date(&self, date: ServiceDate) -> StoreResult<Vec<Ticket>> {
        Ok(TicketRepo::list_by_date(&self.pool, date).await?)
    }

    async fn list_by_customer(&self, customer_id: DbId) -> StoreResult<Vec<Ticket>> {
        Ok(TicketRepo::list_by_customer(&self.pool, customer_id).await?)
    }

    async fn list_by_status_before(
        &self,
        status: TicketStatus,
        cutoff: ServiceDate,
    ) -> StoreResult<Vec<Ticket>> {
        Ok(TicketRepo::list_by_status_before(&self.pool, status, cutoff).await?)
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<Option<Ticket>> {
        Ok(TicketRepo::update(&self.pool, ticket).await?)
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        Ok(TicketRepo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl MaintenanceItemStore for PgStore {
    async fn create(&self, input: &CreateMaintenanceItem) -> StoreResult<MaintenanceItem> {
        Ok(MaintenanceItemRepo::create(&self.pool, input).await?)
    }

    async fn create_batch(
        &self,
        inputs: &[CreateMaintenanceItem],
    ) -> StoreResult<Vec<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::create_batch(&self.pool, inputs).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_ticket(&self, ticket_id: DbId) -> StoreResult<Vec<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::list_by_ticket(&self.pool, ticket_id).await?)
    }

    async fn list_by_ticket_and_status(
        &self,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::list_by_ticket_and_status(&self.pool, ticket_id, status).await?)
    }

    async fn list_by_ticket_and_type(
        &self,
        ticket_id: DbId,
        item_type: ItemType,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::list_by_ticket_and_type(&self.pool, ticket_id, item_type).await?)
    }

    async fn update(
        &self,
        item: &MaintenanceItem,
        expected: ItemStatus,
    ) -> StoreResult<Option<MaintenanceItem>> {
        Ok(MaintenanceItemRepo::update(&self.pool, item, expected).await?)
    }

    async fn set_status_batch(
        &self,
        ids: &[DbId],
        from: ItemStatus,
        status: ItemStatus,
        approved_at: Option<Timestamp>,
    ) -> StoreResult<u64> {
        Ok(
            MaintenanceItemRepo::set_status_batch(&self.pool, ids, from, status, approved_at)
                .await?,
        )
    }

    async fn total_cost(&self, ticket_id: DbId) -> StoreResult<CostSummary> {
        Ok(MaintenanceItemRepo::total_cost(&self.pool, ticket_id).await?)
    }

    async fn count_by_status(&self, ticket_id: DbId, status: ItemStatus) -> StoreResult<i64> {
        Ok(MaintenanceItemRepo::count_by_status(&self.pool, ticket_id, status).await?)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Setting>> {
        Ok(SettingRepo::find(&self.pool, key).await?)
    }

    async fn list(&self, include_hidden: bool) -> StoreResult<Vec<Setting>> {
        Ok(SettingRepo::list(&self.pool, include_hidden).await?)
    }

    async fn update_value(&self, key: &str, value: &str) -> StoreResult<Option<Setting>> {
        Ok(SettingRepo::update_value(&self.pool, key, value).await?)
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_vehicle(&self, id: DbId) -> StoreResult<Option<Vehicle>> {
        Ok(VehicleRepo::find_by_id(&self.pool, id).await?)
    }
}
