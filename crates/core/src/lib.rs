//! Domain rules for the service-bay queue.
//!
//! This crate has zero internal dependencies so the same rules can be used
//! by the repository layer, the queue services, and the HTTP surface.

pub mod error;
pub mod maintenance;
pub mod roles;
pub mod schedule;
pub mod settings;
pub mod ticket;
pub mod types;
