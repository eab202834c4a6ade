//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20260301000001_create_identity_tables.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MECHANIC: &str = "mechanic";
pub const ROLE_CUSTOMER: &str = "customer";

/// Staff roles may operate on any ticket; customers only on their own.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_MECHANIC
}
