//! Who is calling a queue operation.

use bayline_core::error::CoreError;
use bayline_core::roles::is_staff;
use bayline_core::types::DbId;
use bayline_db::models::ticket::Ticket;

/// Staff (mechanics and admins) may act on any ticket. Customers only on
/// tickets they own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Staff(DbId),
    Customer(DbId),
}

impl Actor {
    pub fn from_role(user_id: DbId, role: &str) -> Self {
        if is_staff(role) {
            Actor::Staff(user_id)
        } else {
            Actor::Customer(user_id)
        }
    }

    pub fn user_id(&self) -> DbId {
        match self {
            Actor::Staff(id) | Actor::Customer(id) => *id,
        }
    }

    pub fn ensure_can_access(&self, ticket: &Ticket) -> Result<(), CoreError> {
        match self {
            Actor::Staff(_) => Ok(()),
            Actor::Customer(id) if *id == ticket.customer_id => Ok(()),
            Actor::Customer(_) => Err(CoreError::Unauthorized(format!(
                "ticket {} does not belong to this customer",
                ticket.id
            ))),
        }
    }
}
