//! In-process store.
//!
//! Everything lives behind one mutex, so each trait method is atomic with
//! respect to the others. Ticket allocation follows exactly the sequence
//! `TicketRepo::create_numbered` runs under its advisory lock. Used by the
//! test suites and by `STORE_BACKEND=memory`.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bayline_core::maintenance::{summarize_costs, CostSummary, ItemStatus, ItemType};
use bayline_core::settings::{find_definition, SettingType, QUEUE_SETTINGS};
use bayline_core::ticket::{next_queue_number, TicketStatus};
use bayline_core::types::{DbId, ServiceDate, Timestamp};
use chrono::Utc;

use super::{
    IdentityStore, MaintenanceItemStore, SettingsStore, StoreError, StoreResult, TicketStore,
};
use crate::models::identity::{CreateUser, CreateVehicle, User, Vehicle};
use crate::models::maintenance_item::{CreateMaintenanceItem, MaintenanceItem};
use crate::models::setting::Setting;
use crate::models::ticket::{CreateTicket, Ticket};
use crate::repositories::Allocation;

#[derive(Default)]
struct State {
    tickets: BTreeMap<DbId, Ticket>,
    items: BTreeMap<DbId, MaintenanceItem>,
    settings: BTreeMap<String, Setting>,
    users: BTreeMap<DbId, User>,
    vehicles: BTreeMap<DbId, Vehicle>,
    last_id: DbId,
    failing_deletes: HashSet<DbId>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn tickets_on(&self, date: ServiceDate) -> impl Iterator<Item = &Ticket> {
        self.tickets.values().filter(move |t| t.service_date == date)
    }

    fn insert_ticket(
        &mut self,
        input: &CreateTicket,
        queue_number: i32,
        status: TicketStatus,
    ) -> Ticket {
        let now = Utc::now();
        let ticket = Ticket {
            id: self.next_id(),
            vehicle_id: input.vehicle_id,
            customer_id: input.customer_id,
            queue_number,
            service_date: input.service_date,
            service_type: input.service_type.clone(),
            estimated_time: input.estimated_time,
            notes: input.notes.clone(),
            status,
            called_at: None,
            service_start_at: None,
            service_end_at: None,
            created_at: now,
            updated_at: now,
        };
        self.tickets.insert(ticket.id, ticket.clone());
        ticket
    }

    fn insert_item(&mut self, input: &CreateMaintenanceItem) -> MaintenanceItem {
        let now = Utc::now();
        let item = MaintenanceItem {
            id: self.next_id(),
            ticket_id: input.ticket_id,
            mechanic_id: input.mechanic_id,
            item_type: input.item_type,
            status: input.status,
            category: input.category.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            priority: input.priority,
            estimated_cost: input.estimated_cost,
            actual_cost: None,
            labor_hours: input.labor_hours,
            requires_approval: input.requires_approval,
            image_url: input.image_url.clone(),
            notes: input.notes.clone(),
            inspected_at: input.inspected_at,
            approved_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.items.insert(item.id, item.clone());
        item
    }

    /// Mirrors the `maintenance_items.ticket_id` foreign key.
    fn check_ticket_exists(&self, ticket_id: DbId) -> StoreResult<()> {
        if self.tickets.contains_key(&ticket_id) {
            Ok(())
        } else {
            Err(StoreError::Backend(format!(
                "maintenance item references missing ticket {ticket_id}"
            )))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the queue settings seeded at their defaults.
    pub fn with_default_settings() -> Self {
        let store = Self::new();
        store.seed_default_settings();
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Seeding ------------------------------------------------------------

    pub fn insert_user(&self, input: &CreateUser) -> User {
        let mut state = self.lock();
        let now = Utc::now();
        let user = User {
            id: state.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            role: input.role.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub fn insert_vehicle(&self, input: &CreateVehicle) -> Vehicle {
        let mut state = self.lock();
        let now = Utc::now();
        let vehicle = Vehicle {
            id: state.next_id(),
            owner_id: input.owner_id,
            plate_number: input.plate_number.clone(),
            make: input.make.clone(),
            model: input.model.clone(),
            created_at: now,
            updated_at: now,
        };
        state.vehicles.insert(vehicle.id, vehicle.clone());
        vehicle
    }

    /// Insert a ticket with an explicit number and status, bypassing the
    /// capacity check. For arranging fixtures only.
    pub fn put_ticket(
        &self,
        input: &CreateTicket,
        queue_number: i32,
        status: TicketStatus,
    ) -> Ticket {
        self.lock().insert_ticket(input, queue_number, status)
    }

    pub fn seed_default_settings(&self) {
        for def in QUEUE_SETTINGS {
            self.set_setting(def.key, def.default_value);
        }
    }

    /// Insert or overwrite a setting. Known keys take their declared type;
    /// unknown keys are stored as strings.
    pub fn set_setting(&self, key: &str, value: &str) {
        let mut state = self.lock();
        let now = Utc::now();
        let def = find_definition(key);
        let entry = state.settings.entry(key.to_string()).or_insert_with(|| Setting {
            key: key.to_string(),
            value: String::new(),
            value_type: def.map_or(SettingType::String, |d| d.value_type),
            category: def.map_or("general", |d| d.category).to_string(),
            description: def.map(|d| d.description.to_string()),
            is_editable: true,
            is_visible: true,
            created_at: now,
            updated_at: now,
        });
        entry.value = value.to_string();
        entry.updated_at = now;
    }

    /// Change the admin flags on an existing setting.
    pub fn set_setting_flags(&self, key: &str, is_editable: bool, is_visible: bool) {
        if let Some(setting) = self.lock().settings.get_mut(key) {
            setting.is_editable = is_editable;
            setting.is_visible = is_visible;
        }
    }

    pub fn remove_setting(&self, key: &str) {
        self.lock().settings.remove(key);
    }

    /// Make every later `delete` of ticket `id` fail.
    pub fn fail_delete_of(&self, id: DbId) {
        self.lock().failing_deletes.insert(id);
    }

    pub fn ticket_count(&self) -> usize {
        self.lock().tickets.len()
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_numbered(
        &self,
        input: &CreateTicket,
        max_per_day: i64,
    ) -> StoreResult<Allocation> {
        let mut state = self.lock();

        let active = state
            .tickets_on(input.service_date)
            .filter(|t| t.status.consumes_capacity())
            .count() as i64;
        if active >= max_per_day {
            return Ok(Allocation::Full { active });
        }

        let queue_number =
            next_queue_number(state.tickets_on(input.service_date).map(|t| t.queue_number));
        if i64::from(queue_number) > max_per_day {
            return Ok(Allocation::NumberOverCap { queue_number });
        }

        let ticket = state.insert_ticket(input, queue_number, TicketStatus::Waiting);
        Ok(Allocation::Created(ticket))
    }

    async fn next_queue_number(&self, date: ServiceDate) -> StoreResult<i32> {
        let state = self.lock();
        Ok(next_queue_number(state.tickets_on(date).map(|t| t.queue_number)))
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Ticket>> {
        Ok(self.lock().tickets.get(&id).cloned())
    }

    async fn find_by_queue_number(
        &self,
        date: ServiceDate,
        queue_number: i32,
    ) -> StoreResult<Option<Ticket>> {
        let state = self.lock();
        let found = state
            .tickets_on(date)
            .find(|t| t.queue_number == queue_number)
            .cloned();
        Ok(found)
    }

    async fn list_by_date(&self, date: ServiceDate) -> StoreResult<Vec<Ticket>> {
        let state = self.lock();
        let mut tickets: Vec<Ticket> = state.tickets_on(date).cloned().collect();
        tickets.sort_by_key(|t| t.queue_number);
        Ok(tickets)
    }

    async fn list_by_customer(&self, customer_id: DbId) -> StoreResult<Vec<Ticket>> {
        let state = self.lock();
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            b.service_date
                .cmp(&a.service_date)
                .then(a.queue_number.cmp(&b.queue_number))
        });
        Ok(tickets)
    }

    async fn list_by_status_before(
        &self,
        status: TicketStatus,
        cutoff: ServiceDate,
    ) -> StoreResult<Vec<Ticket>> {
        let state = self.lock();
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.status == status && t.service_date < cutoff)
            .cloned()
            .collect();
        tickets.sort_by_key(|t| (t.service_date, t.queue_number));
        Ok(tickets)
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<Option<Ticket>> {
        let mut state = self.lock();
        let Some(stored) = state.tickets.get_mut(&ticket.id) else {
            return Ok(None);
        };
        stored.vehicle_id = ticket.vehicle_id;
        stored.service_type = ticket.service_type.clone();
        stored.estimated_time = ticket.estimated_time;
        stored.notes = ticket.notes.clone();
        stored.status = ticket.status;
        stored.called_at = ticket.called_at;
        stored.service_start_at = ticket.service_start_at;
        stored.service_end_at = ticket.service_end_at;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.lock();
        if state.failing_deletes.contains(&id) {
            return Err(StoreError::Backend(format!("delete of ticket {id} failed")));
        }
        let removed = state.tickets.remove(&id).is_some();
        if removed {
            state.items.retain(|_, item| item.ticket_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl MaintenanceItemStore for MemoryStore {
    async fn create(&self, input: &CreateMaintenanceItem) -> StoreResult<MaintenanceItem> {
        let mut state = self.lock();
        state.check_ticket_exists(input.ticket_id)?;
        Ok(state.insert_item(input))
    }

    async fn create_batch(
        &self,
        inputs: &[CreateMaintenanceItem],
    ) -> StoreResult<Vec<MaintenanceItem>> {
        let mut state = self.lock();
        for input in inputs {
            state.check_ticket_exists(input.ticket_id)?;
        }
        Ok(inputs.iter().map(|input| state.insert_item(input)).collect())
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<MaintenanceItem>> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn list_by_ticket(&self, ticket_id: DbId) -> StoreResult<Vec<MaintenanceItem>> {
        let state = self.lock();
        Ok(state
            .items
            .values()
            .filter(|i| i.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn list_by_ticket_and_status(
        &self,
        ticket_id: DbId,
        status: ItemStatus,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        let state = self.lock();
        Ok(state
            .items
            .values()
            .filter(|i| i.ticket_id == ticket_id && i.status == status)
            .cloned()
            .collect())
    }

    async fn list_by_ticket_and_type(
        &self,
        ticket_id: DbId,
        item_type: ItemType,
    ) -> StoreResult<Vec<MaintenanceItem>> {
        let state = self.lock();
        Ok(state
            .items
            .values()
            .filter(|i| i.ticket_id == ticket_id && i.item_type == item_type)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        item: &MaintenanceItem,
        expected: ItemStatus,
    ) -> StoreResult<Option<MaintenanceItem>> {
        let mut state = self.lock();
        let Some(stored) = state.items.get_mut(&item.id) else {
            return Ok(None);
        };
        if stored.status != expected {
            return Ok(None);
        }
        let (id, ticket_id, item_type, created_at) =
            (stored.id, stored.ticket_id, stored.item_type, stored.created_at);
        *stored = MaintenanceItem {
            id,
            ticket_id,
            item_type,
            created_at,
            updated_at: Utc::now(),
            ..item.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn set_status_batch(
        &self,
        ids: &[DbId],
        from: ItemStatus,
        status: ItemStatus,
        approved_at: Option<Timestamp>,
    ) -> StoreResult<u64> {
        let mut state = self.lock();
        let all_match = ids
            .iter()
            .all(|id| state.items.get(id).is_some_and(|item| item.status == from));
        if !all_match {
            return Ok(0);
        }

        let now = Utc::now();
        let mut touched = 0;
        for id in ids {
            if let Some(item) = state.items.get_mut(id) {
                item.status = status;
                if approved_at.is_some() {
                    item.approved_at = approved_at;
                }
                item.updated_at = now;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn total_cost(&self, ticket_id: DbId) -> StoreResult<CostSummary> {
        let state = self.lock();
        Ok(summarize_costs(
            state
                .items
                .values()
                .filter(|i| i.ticket_id == ticket_id)
                .map(|i| (i.status, i.estimated_cost, i.actual_cost)),
        ))
    }

    async fn count_by_status(&self, ticket_id: DbId, status: ItemStatus) -> StoreResult<i64> {
        let state = self.lock();
        Ok(state
            .items
            .values()
            .filter(|i| i.ticket_id == ticket_id && i.status == status)
            .count() as i64)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Setting>> {
        Ok(self.lock().settings.get(key).cloned())
    }

    async fn list(&self, include_hidden: bool) -> StoreResult<Vec<Setting>> {
        let state = self.lock();
        let mut settings: Vec<Setting> = state
            .settings
            .values()
            .filter(|s| include_hidden || s.is_visible)
            .cloned()
            .collect();
        settings.sort_by(|a, b| a.category.cmp(&b.category).then(a.key.cmp(&b.key)));
        Ok(settings)
    }

    async fn update_value(&self, key: &str, value: &str) -> StoreResult<Option<Setting>> {
        let mut state = self.lock();
        let Some(setting) = state.settings.get_mut(key) else {
            return Ok(None);
        };
        setting.value = value.to_string();
        setting.updated_at = Utc::now();
        Ok(Some(setting.clone()))
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_vehicle(&self, id: DbId) -> StoreResult<Option<Vehicle>> {
        Ok(self.lock().vehicles.get(&id).cloned())
    }
}
