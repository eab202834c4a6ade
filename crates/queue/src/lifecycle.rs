//! Ticket issuance, capacity and status transitions.

use std::sync::Arc;

use bayline_core::error::CoreError;
use bayline_core::ticket::{
    compute_availability, compute_progress, transition, validate_queue_number, Availability,
    QueueProgress, TicketEvent, TicketStatus,
};
use bayline_core::types::{DbId, ServiceDate};
use bayline_db::models::ticket::{CreateTicket, Ticket};
use bayline_db::repositories::Allocation;
use bayline_db::store::{IdentityStore, Stores, TicketStore};
use chrono::Utc;
use serde::Serialize;

use crate::actor::Actor;
use crate::error::{ServiceResult, StoreContext};
use crate::settings::SettingsProvider;

/// Maximum length for a ticket's service type.
pub const MAX_SERVICE_TYPE_LEN: usize = 100;

/// Availability for one date plus the number the next ticket would get.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub service_date: ServiceDate,
    #[serde(flatten)]
    pub availability: Availability,
    pub next_queue_number: i32,
}

pub struct QueueManager {
    tickets: Arc<dyn TicketStore>,
    identity: Arc<dyn IdentityStore>,
    settings: Arc<SettingsProvider>,
}

impl QueueManager {
    pub fn new(stores: &Stores, settings: Arc<SettingsProvider>) -> Self {
        Self {
            tickets: Arc::clone(&stores.tickets),
            identity: Arc::clone(&stores.identity),
            settings,
        }
    }

    // -- Issuance -----------------------------------------------------------

    /// Issue the next queue number for `input.service_date`.
    ///
    /// Fails with `CapacityExceeded` when the day already holds the maximum
    /// number of active tickets, or when the next number would exceed it.
    /// The count, number allocation and insert happen as one atomic store
    /// operation.
    pub async fn take_queue_number(&self, input: CreateTicket) -> ServiceResult<Ticket> {
        validate_draft(&input)?;

        self.identity
            .find_vehicle(input.vehicle_id)
            .await
            .context(|| format!("look up vehicle {}", input.vehicle_id))?
            .ok_or(CoreError::NotFound {
                entity: "vehicle",
                id: input.vehicle_id,
            })?;
        self.identity
            .find_user(input.customer_id)
            .await
            .context(|| format!("look up customer {}", input.customer_id))?
            .ok_or(CoreError::NotFound {
                entity: "customer",
                id: input.customer_id,
            })?;

        let max_per_day = self.settings.max_tickets_per_day().await?;
        let availability = self
            .check_availability_with(input.service_date, max_per_day)
            .await?;
        if !availability.available {
            return Err(CoreError::CapacityExceeded { max: max_per_day }.into());
        }

        let allocation = self
            .tickets
            .create_numbered(&input, max_per_day)
            .await
            .context(|| format!("allocate ticket for {}", input.service_date))?;

        match allocation {
            Allocation::Created(ticket) => {
                tracing::info!(
                    ticket_id = ticket.id,
                    queue_number = ticket.queue_number,
                    service_date = %ticket.service_date,
                    customer_id = ticket.customer_id,
                    "Queue number issued"
                );
                Ok(ticket)
            }
            Allocation::Full { active } => {
                tracing::info!(
                    service_date = %input.service_date,
                    active,
                    max_per_day,
                    "Day filled before allocation"
                );
                Err(CoreError::CapacityExceeded { max: max_per_day }.into())
            }
            Allocation::NumberOverCap { queue_number } => {
                validate_queue_number(queue_number, max_per_day)?;
                Err(CoreError::CapacityExceeded { max: max_per_day }.into())
            }
        }
    }

    /// Slot usage for `date` under the current cap.
    pub async fn check_availability(&self, date: ServiceDate) -> ServiceResult<Availability> {
        let max_per_day = self.settings.max_tickets_per_day().await?;
        self.check_availability_with(date, max_per_day).await
    }

    pub async fn day_availability(&self, date: ServiceDate) -> ServiceResult<DayAvailability> {
        let availability = self.check_availability(date).await?;
        let next_queue_number = self
            .tickets
            .next_queue_number(date)
            .await
            .context(|| format!("next queue number for {date}"))?;
        Ok(DayAvailability {
            service_date: date,
            availability,
            next_queue_number,
        })
    }

    async fn check_availability_with(
        &self,
        date: ServiceDate,
        max_per_day: i64,
    ) -> ServiceResult<Availability> {
        let tickets = self.list_for_date(date).await?;
        Ok(compute_availability(
            tickets.iter().map(|t| t.status),
            max_per_day,
        ))
    }

    // -- Transitions --------------------------------------------------------

    pub async fn call_customer(&self, id: DbId) -> ServiceResult<Ticket> {
        self.apply(id, TicketEvent::Call).await
    }

    pub async fn start_service(&self, id: DbId) -> ServiceResult<Ticket> {
        self.apply(id, TicketEvent::StartService).await
    }

    pub async fn complete_service(&self, id: DbId) -> ServiceResult<Ticket> {
        self.apply(id, TicketEvent::CompleteService).await
    }

    pub async fn mark_no_show(&self, id: DbId) -> ServiceResult<Ticket> {
        self.apply(id, TicketEvent::MarkNoShow).await
    }

    pub async fn cancel(&self, id: DbId) -> ServiceResult<Ticket> {
        self.apply(id, TicketEvent::Cancel).await
    }

    /// Cancel on behalf of `actor`. Customers may only cancel their own
    /// tickets.
    pub async fn cancel_as(&self, id: DbId, actor: Actor) -> ServiceResult<Ticket> {
        self.get_ticket_as(id, actor).await?;
        tracing::debug!(ticket_id = id, requested_by = actor.user_id(), "Cancel requested");
        self.cancel(id).await
    }

    async fn apply(&self, id: DbId, event: TicketEvent) -> ServiceResult<Ticket> {
        let mut ticket = self.get_ticket(id).await?;
        let from = ticket.status;
        ticket.status = transition(from, event)?;

        let now = Utc::now();
        match event {
            TicketEvent::Call => ticket.called_at = Some(now),
            TicketEvent::StartService => ticket.service_start_at = Some(now),
            TicketEvent::CompleteService => ticket.service_end_at = Some(now),
            TicketEvent::MarkNoShow | TicketEvent::Cancel => {}
        }

        let updated = self
            .tickets
            .update(&ticket)
            .await
            .context(|| format!("{} ticket {id}", event.name()))?
            .ok_or(CoreError::NotFound {
                entity: "ticket",
                id,
            })?;

        tracing::info!(
            ticket_id = id,
            queue_number = updated.queue_number,
            event = event.name(),
            from = %from,
            to = %updated.status,
            "Ticket status changed"
        );
        Ok(updated)
    }

    // -- Reads --------------------------------------------------------------

    pub async fn get_ticket(&self, id: DbId) -> ServiceResult<Ticket> {
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

    /// Load a ticket, checking that `actor` may see it.
    pub async fn get_ticket_as(&self, id: DbId, actor: Actor) -> ServiceResult<Ticket> {
        let ticket = self.get_ticket(id).await?;
        actor.ensure_can_access(&ticket)?;
        Ok(ticket)
    }

    pub async fn find_by_queue_number(
        &self,
        date: ServiceDate,
        queue_number: i32,
    ) -> ServiceResult<Option<Ticket>> {
        self.tickets
            .find_by_queue_number(date, queue_number)
            .await
            .context(|| format!("load ticket {date} #{queue_number}"))
    }

    pub async fn list_for_date(&self, date: ServiceDate) -> ServiceResult<Vec<Ticket>> {
        self.tickets
            .list_by_date(date)
            .await
            .context(|| format!("list tickets for {date}"))
    }

    pub async fn list_for_customer(&self, customer_id: DbId) -> ServiceResult<Vec<Ticket>> {
        self.tickets
            .list_by_customer(customer_id)
            .await
            .context(|| format!("list tickets for customer {customer_id}"))
    }

    pub async fn list_by_status_before(
        &self,
        status: TicketStatus,
        cutoff: ServiceDate,
    ) -> ServiceResult<Vec<Ticket>> {
        self.tickets
            .list_by_status_before(status, cutoff)
            .await
            .context(|| format!("list {status} tickets before {cutoff}"))
    }

    // -- Progress -----------------------------------------------------------

    /// Customer-facing queue position for a ticket.
    pub async fn progress(&self, id: DbId) -> ServiceResult<QueueProgress> {
        let ticket = self.get_ticket(id).await?;
        self.progress_of(&ticket).await
    }

    pub async fn progress_as(&self, id: DbId, actor: Actor) -> ServiceResult<QueueProgress> {
        let ticket = self.get_ticket_as(id, actor).await?;
        self.progress_of(&ticket).await
    }

    async fn progress_of(&self, ticket: &Ticket) -> ServiceResult<QueueProgress> {
        let same_day: Vec<(i32, TicketStatus)> = self
            .list_for_date(ticket.service_date)
            .await?
            .iter()
            .map(|t| (t.queue_number, t.status))
            .collect();
        Ok(compute_progress(ticket.queue_number, ticket.status, &same_day))
    }
}

fn validate_draft(input: &CreateTicket) -> Result<(), CoreError> {
    let service_type = input.service_type.trim();
    if service_type.is_empty() {
        return Err(CoreError::Validation(
            "service_type must not be empty".to_string(),
        ));
    }
    if service_type.len() > MAX_SERVICE_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "service_type exceeds maximum length of {MAX_SERVICE_TYPE_LEN} characters"
        )));
    }
    if input.estimated_time.is_some_and(|m| m <= 0) {
        return Err(CoreError::Validation(
            "estimated_time must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}
