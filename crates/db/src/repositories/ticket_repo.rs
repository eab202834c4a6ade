//! Repository for the `tickets` table.

use bayline_core::ticket::{TicketStatus, ACTIVE_STATUSES};
use bayline_core::types::{DbId, ServiceDate};
use sqlx::PgPool;

use crate::models::ticket::{CreateTicket, Ticket};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, vehicle_id, customer_id, queue_number, service_date, service_type, \
    estimated_time, notes, status, called_at, service_start_at, service_end_at, \
    created_at, updated_at";

/// Advisory lock namespace serializing queue-number allocation. The second
/// lock key is the service date, so different days never contend.
pub const TICKET_ALLOCATION_LOCK_ID: i32 = 736_201;

/// Outcome of an allocation attempt made under the per-date lock.
#[derive(Debug, Clone)]
pub enum Allocation {
    /// The ticket was inserted with the next queue number.
    Created(Ticket),
    /// The date already holds `active` tickets, at or above the cap.
    Full { active: i64 },
    /// The next queue number would exceed the cap even though slots are free
    /// (earlier tickets were canceled; numbers are never reused).
    NumberOverCap { queue_number: i32 },
}

/// Provides CRUD operations for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a ticket for `input.service_date` if the day is below
    /// `max_per_day`.
    ///
    /// Runs inside one transaction holding a per-date advisory lock: count
    /// active tickets, compute `max(queue_number) + 1`, refuse if either
    /// exceeds the cap, otherwise insert as `waiting`. The unique constraint
    /// on `(service_date, queue_number)` backs this up.
    pub async fn create_numbered(
        pool: &PgPool,
        input: &CreateTicket,
        max_per_day: i64,
    ) -> Result<Allocation, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(TICKET_ALLOCATION_LOCK_ID)
            .bind(day_key(input.service_date))
            .execute(&mut *tx)
            .await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tickets WHERE service_date = $1 AND status = ANY($2)",
        )
        .bind(input.service_date)
        .bind(active_statuses())
        .fetch_one(&mut *tx)
        .await?;

        if active >= max_per_day {
            tracing::debug!(
                service_date = %input.service_date,
                active,
                max_per_day,
                "Allocation refused, day is full"
            );
            tx.rollback().await?;
            return Ok(Allocation::Full { active });
        }

        let queue_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(queue_number), 0) + 1 FROM tickets WHERE service_date = $1",
        )
        .bind(input.service_date)
        .fetch_one(&mut *tx)
        .await?;

        if i64::from(queue_number) > max_per_day {
            tracing::debug!(
                service_date = %input.service_date,
                queue_number,
                max_per_day,
                "Allocation refused, number past cap"
            );
            tx.rollback().await?;
            return Ok(Allocation::NumberOverCap { queue_number });
        }

        let query = format!(
            "INSERT INTO tickets
                (vehicle_id, customer_id, queue_number, service_date, service_type,
                 estimated_time, notes, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let ticket = sqlx::query_as::<_, Ticket>(&query)
            .bind(input.vehicle_id)
            .bind(input.customer_id)
            .bind(queue_number)
            .bind(input.service_date)
            .bind(&input.service_type)
            .bind(input.estimated_time)
            .bind(&input.notes)
            .bind(TicketStatus::Waiting.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Allocation::Created(ticket))
    }

    /// The number the next ticket for `date` would receive.
    pub async fn next_queue_number(pool: &PgPool, date: ServiceDate) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(MAX(queue_number), 0) + 1 FROM tickets WHERE service_date = $1",
        )
        .bind(date)
        .fetch_one(pool)
        .await
    }

    /// Find a ticket by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a ticket by its per-date queue number.
    pub async fn find_by_queue_number(
        pool: &PgPool,
        date: ServiceDate,
        queue_number: i32,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tickets WHERE service_date = $1 AND queue_number = $2");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(date)
            .bind(queue_number)
            .fetch_optional(pool)
            .await
    }

    /// List all tickets for a service date, ordered by queue number.
    pub async fn list_by_date(pool: &PgPool, date: ServiceDate) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets WHERE service_date = $1 ORDER BY queue_number ASC"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// List a customer's tickets, newest service date first.
    pub async fn list_by_customer(
        pool: &PgPool,
        customer_id: DbId,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets WHERE customer_id = $1
             ORDER BY service_date DESC, queue_number ASC"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }

    /// List tickets in `status` whose service date is strictly before `cutoff`.
    pub async fn list_by_status_before(
        pool: &PgPool,
        status: TicketStatus,
        cutoff: ServiceDate,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets WHERE status = $1 AND service_date < $2
             ORDER BY service_date ASC, queue_number ASC"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(status.as_str())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Overwrite every mutable column. Last writer wins.
    ///
    /// `queue_number`, `service_date` and `created_at` are never rewritten.
    pub async fn update(pool: &PgPool, ticket: &Ticket) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET
                vehicle_id = $2,
                service_type = $3,
                estimated_time = $4,
                notes = $5,
                status = $6,
                called_at = $7,
                service_start_at = $8,
                service_end_at = $9,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(ticket.id)
            .bind(ticket.vehicle_id)
            .bind(&ticket.service_type)
            .bind(ticket.estimated_time)
            .bind(&ticket.notes)
            .bind(ticket.status.as_str())
            .bind(ticket.called_at)
            .bind(ticket.service_start_at)
            .bind(ticket.service_end_at)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a ticket (its items cascade). Returns `true` if a row was
    /// removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn active_statuses() -> Vec<&'static str> {
    ACTIVE_STATUSES.iter().map(TicketStatus::as_str).collect()
}

/// Second advisory-lock key: days since 2000-01-01.
fn day_key(date: ServiceDate) -> i32 {
    let epoch = ServiceDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    i32::try_from((date - epoch).num_days()).unwrap_or(i32::MAX)
}
