//! Repair items attached to a ticket and the customer approval workflow.
//!
//! Initial items are agreed up front and start `pending`. Discovered items
//! are logged by a mechanic while the vehicle is in service, start
//! `inspected`, and need the ticket owner's decision. Approval is a batch
//! operation: every item is validated before any of them changes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bayline_core::error::CoreError;
use bayline_core::maintenance::{
    decision_status, validate_amount, validate_can_complete, validate_can_decide,
    validate_can_skip, validate_discovery_allowed, validate_name, CostSummary, ItemStatus,
    ItemType,
};
use bayline_core::types::DbId;
use bayline_db::models::maintenance_item::{
    CreateMaintenanceItem, DiscoveredItemInput, InitialItemInput, ItemListParams,
    MaintenanceItem,
};
use bayline_db::models::ticket::Ticket;
use bayline_db::store::{IdentityStore, MaintenanceItemStore, Stores, TicketStore};
use chrono::Utc;
use serde::Serialize;

use crate::error::{ServiceResult, StoreContext};

/// Item counts per status for one ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub inspected: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
    pub skipped: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.inspected + self.approved + self.rejected + self.completed + self.skipped
    }

    fn slot(&mut self, status: ItemStatus) -> &mut i64 {
        match status {
            ItemStatus::Pending => &mut self.pending,
            ItemStatus::Inspected => &mut self.inspected,
            ItemStatus::Approved => &mut self.approved,
            ItemStatus::Rejected => &mut self.rejected,
            ItemStatus::Completed => &mut self.completed,
            ItemStatus::Skipped => &mut self.skipped,
        }
    }
}

/// Inspection overview shown to the customer and the service desk.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionSummary {
    pub ticket_id: DbId,
    pub total_items: i64,
    pub counts: StatusCounts,
    /// Inspected items still waiting for the customer's decision.
    pub awaiting_decision: i64,
    pub cost: CostSummary,
}

const ALL_ITEM_STATUSES: [ItemStatus; 6] = [
    ItemStatus::Pending,
    ItemStatus::Inspected,
    ItemStatus::Approved,
    ItemStatus::Rejected,
    ItemStatus::Completed,
    ItemStatus::Skipped,
];

pub struct MaintenanceManager {
    tickets: Arc<dyn TicketStore>,
    items: Arc<dyn MaintenanceItemStore>,
    identity: Arc<dyn IdentityStore>,
}

impl MaintenanceManager {
    pub fn new(stores: &Stores) -> Self {
        Self {
            tickets: Arc::clone(&stores.tickets),
            items: Arc::clone(&stores.items),
            identity: Arc::clone(&stores.identity),
        }
    }

    /// Record the pre-agreed items for a ticket. All rows are created or
    /// none are.
    pub async fn create_initial_items(
        &self,
        ticket_id: DbId,
        inputs: Vec<InitialItemInput>,
    ) -> ServiceResult<Vec<MaintenanceItem>> {
        for input in &inputs {
            validate_name(&input.name)?;
            validate_amount("estimated_cost", input.estimated_cost)?;
            if let Some(hours) = input.labor_hours {
                validate_amount("labor_hours", hours)?;
            }
        }
        self.load_ticket(ticket_id).await?;

        let records: Vec<CreateMaintenanceItem> = inputs
            .into_iter()
            .map(|input| CreateMaintenanceItem {
                ticket_id,
                mechanic_id: None,
                item_type: ItemType::Initial,
                status: ItemStatus::Pending,
                category: input.category,
                name: input.name.trim().to_string(),
                description: input.description,
                priority: input.priority,
                estimated_cost: input.estimated_cost,
                labor_hours: input.labor_hours,
                requires_approval: false,
                image_url: None,
                notes: input.notes,
                inspected_at: None,
            })
            .collect();

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let created = self
            .items
            .create_batch(&records)
            .await
            .context(|| format!("create initial items for ticket {ticket_id}"))?;
        tracing::info!(ticket_id, count = created.len(), "Initial items created");
        Ok(created)
    }

    /// Log an item a mechanic found during service. The ticket must be in
    /// service.
    pub async fn add_discovered_item(
        &self,
        mechanic_id: DbId,
        input: DiscoveredItemInput,
    ) -> ServiceResult<MaintenanceItem> {
        validate_name(&input.name)?;
        validate_amount("estimated_cost", input.estimated_cost)?;
        if let Some(hours) = input.labor_hours {
            validate_amount("labor_hours", hours)?;
        }

        let ticket = self.load_ticket(input.ticket_id).await?;
        validate_discovery_allowed(ticket.status)?;

        self.identity
            .find_user(mechanic_id)
            .await
            .context(|| format!("look up mechanic {mechanic_id}"))?
            .ok_or(CoreError::NotFound {
                entity: "mechanic",
                id: mechanic_id,
            })?;

        let record = CreateMaintenanceItem {
            ticket_id: ticket.id,
            mechanic_id: Some(mechanic_id),
            item_type: ItemType::Discovered,
            status: ItemStatus::Inspected,
            category: input.category,
            name: input.name.trim().to_string(),
            description: input.description,
            priority: input.priority,
            estimated_cost: input.estimated_cost,
            labor_hours: input.labor_hours,
            requires_approval: input.requires_approval,
            image_url: input.image_url,
            notes: input.notes,
            inspected_at: Some(Utc::now()),
        };

        let item = self
            .items
            .create(&record)
            .await
            .context(|| format!("create discovered item for ticket {}", ticket.id))?;
        tracing::info!(
            ticket_id = ticket.id,
            item_id = item.id,
            mechanic_id,
            priority = %item.priority,
            "Discovered item logged"
        );
        Ok(item)
    }

    /// Approve or reject inspected items on behalf of `customer_id`.
    ///
    /// Every item must exist, belong to one of the customer's tickets and be
    /// `inspected`. If any check fails nothing is changed.
    pub async fn approve_items(
        &self,
        customer_id: DbId,
        item_ids: &[DbId],
        approve: bool,
    ) -> ServiceResult<Vec<MaintenanceItem>> {
        if item_ids.is_empty() {
            return Err(CoreError::Validation("item_ids must not be empty".to_string()).into());
        }
        let mut seen = HashSet::new();
        let ids: Vec<DbId> = item_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut owners: HashMap<DbId, DbId> = HashMap::new();
        for &id in &ids {
            let item = self.load_item(id).await?;
            let owner = match owners.get(&item.ticket_id) {
                Some(owner) => *owner,
                None => {
                    let ticket = self.load_ticket(item.ticket_id).await?;
                    owners.insert(ticket.id, ticket.customer_id);
                    ticket.customer_id
                }
            };
            if owner != customer_id {
                return Err(CoreError::Unauthorized(format!(
                    "item {id} does not belong to this customer"
                ))
                .into());
            }
            validate_can_decide(item.status)?;
        }

        let status = decision_status(approve);
        let approved_at = approve.then(Utc::now);
        let touched = self
            .items
            .set_status_batch(&ids, ItemStatus::Inspected, status, approved_at)
            .await
            .context(|| format!("set {status} on items {ids:?}"))?;
        if touched != ids.len() as u64 {
            // Another decision landed between the checks and the write.
            return Err(CoreError::InvalidTransition(
                "item is not in inspected status".to_string(),
            )
            .into());
        }

        tracing::info!(customer_id, items = ?ids, decision = %status, "Items decided");

        let mut updated = Vec::with_capacity(ids.len());
        for &id in &ids {
            updated.push(self.load_item(id).await?);
        }
        Ok(updated)
    }

    /// Mark an approved or pending item done with its final cost.
    pub async fn complete_item(
        &self,
        item_id: DbId,
        actual_cost: f64,
    ) -> ServiceResult<MaintenanceItem> {
        validate_amount("actual_cost", actual_cost)?;
        let mut item = self.load_item(item_id).await?;
        let from = item.status;
        validate_can_complete(from)?;

        item.status = ItemStatus::Completed;
        item.actual_cost = Some(actual_cost);
        item.completed_at = Some(Utc::now());
        let item = self.save_item(&item, from, validate_can_complete).await?;

        tracing::info!(item_id, ticket_id = item.ticket_id, actual_cost, "Item completed");
        Ok(item)
    }

    /// Drop a pending item without doing the work.
    pub async fn skip_item(&self, item_id: DbId) -> ServiceResult<MaintenanceItem> {
        let mut item = self.load_item(item_id).await?;
        validate_can_skip(item.status)?;

        item.status = ItemStatus::Skipped;
        let item = self
            .save_item(&item, ItemStatus::Pending, validate_can_skip)
            .await?;

        tracing::info!(item_id, ticket_id = item.ticket_id, "Item skipped");
        Ok(item)
    }

    pub async fn list_items(
        &self,
        ticket_id: DbId,
        params: &ItemListParams,
    ) -> ServiceResult<Vec<MaintenanceItem>> {
        self.load_ticket(ticket_id).await?;
        let items: Vec<MaintenanceItem> = match (params.status, params.item_type) {
            (Some(status), item_type) => self
                .items
                .list_by_ticket_and_status(ticket_id, status)
                .await
                .context(|| format!("list {status} items for ticket {ticket_id}"))?
                .into_iter()
                .filter(|i| item_type.map_or(true, |t| i.item_type == t))
                .collect(),
            (None, Some(item_type)) => self
                .items
                .list_by_ticket_and_type(ticket_id, item_type)
                .await
                .context(|| format!("list {item_type} items for ticket {ticket_id}"))?,
            (None, None) => self
                .items
                .list_by_ticket(ticket_id)
                .await
                .context(|| format!("list items for ticket {ticket_id}"))?,
        };
        Ok(items)
    }

    /// Estimated and actual totals, ignoring rejected and skipped items.
    pub async fn total_cost(&self, ticket_id: DbId) -> ServiceResult<CostSummary> {
        self.items
            .total_cost(ticket_id)
            .await
            .context(|| format!("total cost for ticket {ticket_id}"))
    }

    pub async fn inspection_summary(&self, ticket_id: DbId) -> ServiceResult<InspectionSummary> {
        self.load_ticket(ticket_id).await?;

        let mut counts = StatusCounts::default();
        for status in ALL_ITEM_STATUSES {
            *counts.slot(status) = self
                .items
                .count_by_status(ticket_id, status)
                .await
                .context(|| format!("count {status} items for ticket {ticket_id}"))?;
        }

        Ok(InspectionSummary {
            ticket_id,
            total_items: counts.total(),
            awaiting_decision: counts.inspected,
            counts,
            cost: self.total_cost(ticket_id).await?,
        })
    }

    async fn load_ticket(&self, id: DbId) -> ServiceResult<Ticket> {
        self.tickets
            .find_by_id(id)
            .await
            .context(|| format!("load ticket {id}"))?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "ticket",
                    id,
                }
                .into()
            })
    }

    async fn load_item(&self, id: DbId) -> ServiceResult<MaintenanceItem> {
        self.items
            .find_by_id(id)
            .await
            .context(|| format!("load item {id}"))?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "maintenance_item",
                    id,
                }
                .into()
            })
    }

    /// Write `item` if it is still in `expected` status. When the write is
    /// refused, the current row is re-read and run through `guard` so the
    /// caller sees the same error a fresh request would.
    async fn save_item(
        &self,
        item: &MaintenanceItem,
        expected: ItemStatus,
        guard: fn(ItemStatus) -> Result<(), CoreError>,
    ) -> ServiceResult<MaintenanceItem> {
        let id = item.id;
        if let Some(saved) = self
            .items
            .update(item, expected)
            .await
            .context(|| format!("update item {id}"))?
        {
            return Ok(saved);
        }

        let current = self.load_item(id).await?;
        guard(current.status)?;
        Err(CoreError::InvalidTransition(format!(
            "item {id} changed status to {} during the update",
            current.status
        ))
        .into())
    }
}
