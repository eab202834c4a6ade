//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod maintenance_item_repo;
pub mod setting_repo;
pub mod ticket_repo;
pub mod user_repo;
pub mod vehicle_repo;

pub use maintenance_item_repo::MaintenanceItemRepo;
pub use setting_repo::SettingRepo;
pub use ticket_repo::{Allocation, TicketRepo};
pub use user_repo::UserRepo;
pub use vehicle_repo::VehicleRepo;
