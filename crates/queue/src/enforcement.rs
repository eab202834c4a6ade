//! Daily queue maintenance: retention cleanup and capacity re-enforcement.
//!
//! One call to [`EnforcementJob::run_once`] performs a full pass:
//!
//! 1. Exit early when `queue.cleanup_enabled` is false.
//! 2. Hard-delete completed, canceled and no-show tickets whose service
//!    date is older than `queue.cleanup_retention_days`. A failed delete is
//!    logged and left for the next run.
//! 3. Re-read today's tickets and, if more are waiting than
//!    `queue.max_tickets_per_day` allows, cancel the waiting tickets with the
//!    highest queue numbers until the surplus is gone.
//!
//! Running the pass twice with no changes in between does nothing the second
//! time. Outcomes are reported through logs only.

use std::sync::Arc;

use bayline_core::ticket::{
    auto_cancel_note, retention_cutoff, select_excess_waiting, transition, TicketEvent,
    TicketStatus, TERMINAL_STATUSES,
};
use bayline_core::types::ServiceDate;
use bayline_db::store::{Stores, TicketStore};
use chrono::Utc;

use crate::error::{ServiceResult, StoreContext};
use crate::settings::SettingsProvider;

pub struct EnforcementJob {
    tickets: Arc<dyn TicketStore>,
    settings: Arc<SettingsProvider>,
}

impl EnforcementJob {
    pub fn new(stores: &Stores, settings: Arc<SettingsProvider>) -> Self {
        Self {
            tickets: Arc::clone(&stores.tickets),
            settings,
        }
    }

    /// Run one pass for the current UTC date.
    pub async fn run_now(&self) -> ServiceResult<()> {
        self.run_once(Utc::now().date_naive()).await
    }

    /// Run one pass treating `today` as the current date.
    pub async fn run_once(&self, today: ServiceDate) -> ServiceResult<()> {
        if !self.settings.cleanup_enabled().await? {
            tracing::info!("Queue enforcement disabled, skipping");
            return Ok(());
        }

        self.purge_expired(today).await?;
        self.cancel_excess_waiting(today).await?;
        Ok(())
    }

    async fn purge_expired(&self, today: ServiceDate) -> ServiceResult<()> {
        let retention_days = self.settings.retention_days().await?;
        let cutoff = retention_cutoff(today, retention_days);

        let mut deleted = 0usize;
        let mut failed = 0usize;
        for status in TERMINAL_STATUSES {
            let expired = self
                .tickets
                .list_by_status_before(status, cutoff)
                .await
                .context(|| format!("list {status} tickets before {cutoff}"))?;

            for ticket in expired {
                match self.tickets.delete(ticket.id).await {
                    Ok(true) => deleted += 1,
                    Ok(false) => {
                        tracing::debug!(ticket_id = ticket.id, "Ticket already gone");
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(
                            ticket_id = ticket.id,
                            status = %status,
                            service_date = %ticket.service_date,
                            error = %e,
                            "Failed to delete expired ticket, will retry next run"
                        );
                    }
                }
            }
        }

        if deleted > 0 || failed > 0 {
            tracing::info!(
                deleted,
                failed,
                retention_days,
                cutoff = %cutoff,
                "Queue retention cleanup finished"
            );
        } else {
            tracing::debug!(cutoff = %cutoff, "Queue retention: nothing to purge");
        }
        Ok(())
    }

    async fn cancel_excess_waiting(&self, today: ServiceDate) -> ServiceResult<()> {
        let max_per_day = self.settings.max_tickets_per_day().await?;

        let waiting: Vec<_> = self
            .tickets
            .list_by_date(today)
            .await
            .context(|| format!("list tickets for {today}"))?
            .into_iter()
            .filter(|t| t.status == TicketStatus::Waiting)
            .collect();
        let waiting_count = waiting.len();

        let excess = select_excess_waiting(waiting, max_per_day, |t| t.queue_number);
        if excess.is_empty() {
            tracing::debug!(waiting_count, max_per_day, "Waiting queue within daily limit");
            return Ok(());
        }

        let mut canceled = 0usize;
        for stale in excess {
            let id = stale.id;
            // Re-read so a ticket called since the listing is left alone.
            let Some(mut ticket) = self
                .tickets
                .find_by_id(id)
                .await
                .context(|| format!("reload ticket {id}"))?
            else {
                continue;
            };
            if ticket.status != TicketStatus::Waiting {
                continue;
            }

            ticket.status = transition(ticket.status, TicketEvent::Cancel)?;
            ticket.notes = Some(auto_cancel_note(ticket.notes.as_deref(), max_per_day));
            self.tickets
                .update(&ticket)
                .await
                .context(|| format!("auto-cancel ticket {id}"))?;

            canceled += 1;
            tracing::info!(
                ticket_id = id,
                queue_number = ticket.queue_number,
                max_per_day,
                "Ticket auto-canceled, daily limit exceeded"
            );
        }

        tracing::info!(
            service_date = %today,
            waiting_count,
            canceled,
            max_per_day,
            "Daily limit re-enforced"
        );
        Ok(())
    }
}
