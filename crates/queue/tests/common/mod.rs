#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bayline_core::maintenance::{CostSummary, ItemStatus, ItemType};
use bayline_core::roles::{ROLE_CUSTOMER, ROLE_MECHANIC};
use bayline_core::ticket::TicketStatus;
use bayline_core::types::{DbId, ServiceDate, Timestamp};
use bayline_db::models::identity::{CreateUser, CreateVehicle, User, Vehicle};
use bayline_db::models::maintenance_item::{CreateMaintenanceItem, MaintenanceItem};
use bayline_db::models::ticket::{CreateTicket, Ticket};
use bayline_db::store::{MaintenanceItemStore, MemoryStore, StoreResult, Stores};
use bayline_queue::{EnforcementJob, MaintenanceManager, QueueManager, SettingsProvider};

/// Services wired to one in-process store with default settings, a
/// mechanic, two customers and a vehicle for each customer.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub settings: Arc<SettingsProvider>,
    pub queue: QueueManager,
    pub items: MaintenanceManager,
    pub job: EnforcementJob,
    pub mechanic: User,
    pub customer: User,
    pub vehicle: Vehicle,
    pub other_customer: User,
    pub other_vehicle: Vehicle,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Like [`Fixture::new`], but every item read yields to the scheduler so
    /// concurrent requests interleave between their checks and writes.
    pub fn with_yielding_item_reads() -> Self {
        Self::build(true)
    }

    fn build(yielding_reads: bool) -> Self {
        let store = Arc::new(MemoryStore::with_default_settings());
        let mut stores = Stores::memory(Arc::clone(&store));
        if yielding_reads {
            stores.items = Arc::new(YieldingItems(Arc::clone(&store)));
        }
        // No caching, so settings changed mid-test are seen immediately.
        let settings = Arc::new(SettingsProvider::new(
            Arc::clone(&stores.settings),
            Duration::ZERO,
        ));

        let mechanic = store.insert_user(&user("Mo", "mo@bay.test", ROLE_MECHANIC));
        let customer = store.insert_user(&user("Cy", "cy@bay.test", ROLE_CUSTOMER));
        let other_customer = store.insert_user(&user("Oz", "oz@bay.test", ROLE_CUSTOMER));
        let vehicle = store.insert_vehicle(&vehicle(customer.id, "B 1 CY"));
        let other_vehicle = store.insert_vehicle(&self::vehicle(other_customer.id, "B 2 OZ"));

        Self {
            queue: QueueManager::new(&stores, Arc::clone(&settings)),
            items: MaintenanceManager::new(&stores),
            job: EnforcementJob::new(&stores, Arc::clone(&settings)),
            store,
            settings,
            mechanic,
            customer,
            vehicle,
            other_customer,
            other_vehicle,
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.store.set_setting(key, value);
    }

    /// A ticket request from the main customer.
    pub fn draft(&self, date: ServiceDate) -> CreateTicket {
        CreateTicket {
            vehicle_id: self.vehicle.id,
            customer_id: self.customer.id,
            service_date: date,
            service_type: "Periodic service".to_string(),
            estimated_time: Some(60),
            notes: None,
        }
    }

    pub fn other_draft(&self, date: ServiceDate) -> CreateTicket {
        CreateTicket {
            vehicle_id: self.other_vehicle.id,
            customer_id: self.other_customer.id,
            ..self.draft(date)
        }
    }

    /// Seed a ticket directly into the store.
    pub fn put(&self, date: ServiceDate, queue_number: i32, status: TicketStatus) -> Ticket {
        self.store.put_ticket(&self.draft(date), queue_number, status)
    }

    /// Take a ticket and walk it to `in_service`.
    pub async fn ticket_in_service(&self, date: ServiceDate) -> Ticket {
        let ticket = self.queue.take_queue_number(self.draft(date)).await.unwrap();
        self.queue.call_customer(ticket.id).await.unwrap();
        self.queue.start_service(ticket.id).await.unwrap()
    }
}

/// Item store that yields before every single-row read.
struct YieldingItems(Arc<MemoryStore>);

#[async_trait]
impl MaintenanceItemStore for YieldingItems {
    async fn create(&self, input: &CreateMaintenanceItem) -> StoreResult<MaintenanceItem> {
        self.0.create(input).await
    }

    async fn create_batch(
        &self,
        inputs: &[CreateMaintenanceItem],
    ) -> StoreResult<Vec<MaintenanceItem>> {
        self.0.create_batch(inputs).await
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<MaintenanceItem>> {
        tokio::task::yield_now().await;
        self.0.find_by_id(id).await
    }

    async fn list_by_ticket(&self, ticket_id: DbId) -> StoreResult<Vec<MaintenanceItem>> {
        self.0.list_by_ticket(ticket_id).await
    }

    async fn list_by_ticket_and_status(
        &self,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        self.0.list_by_ticket_and_status(ticket_id, status).await
    }

    async fn list_by_ticket_and_type(
        &self,
        ticket_id: DbId,
        item_type: ItemType,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        self.0.list_by_ticket_and_type(ticket_id, item_type).await
    }

    async fn update(
        &self,
        item: &MaintenanceItem,
        expected: ItemStatus,
    ) -> StoreResult<Option<MaintenanceItem>> {
        self.0.update(item, expected).await
    }

    async fn set_status_batch(
        &self,
        ids: &[DbId],
        from: ItemStatus,
        status: ItemStatus,
        approved_at: Option<Timestamp>,
    ) -> StoreResult<u64> {
        self.0.set_status_batch(ids, from, status, approved_at).await
    }

    async fn total_cost(&self, ticket_id: DbId) -> StoreResult<CostSummary> {
        self.0.total_cost(ticket_id).await
    }

    async fn count_by_status(&self, ticket_id: DbId, status: ItemStatus) -> StoreResult<i64> {
        self.0.count_by_status(ticket_id, status).await
    }
}

fn user(name: &str, email: &str, role: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
    }
}

fn vehicle(owner_id: i64, plate: &str) -> CreateVehicle {
    CreateVehicle {
        owner_id,
        plate_number: plate.to_string(),
        make: None,
        model: None,
    }
}

pub fn day(raw: &str) -> ServiceDate {
    bayline_core::ticket::parse_service_date(raw).unwrap()
}
