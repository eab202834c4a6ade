//! Queue services for the service bay.
//!
//! - [`SettingsProvider`] -- typed, cached reads of the `settings` table.
//! - [`QueueManager`] -- ticket issuance, capacity checks, status transitions
//!   and customer progress.
//! - [`MaintenanceManager`] -- initial and discovered repair items, customer
//!   approval, completion and cost totals.
//! - [`EnforcementJob`] -- the daily retention cleanup and capacity pass.
//!
//! Every service talks to storage through the traits in
//! [`bayline_db::store`], so the same code runs against Postgres or the
//! in-process store.

pub mod actor;
pub mod enforcement;
pub mod error;
pub mod lifecycle;
pub mod maintenance;
pub mod settings;

pub use actor::Actor;
pub use enforcement::EnforcementJob;
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::QueueManager;
pub use maintenance::MaintenanceManager;
pub use settings::SettingsProvider;
