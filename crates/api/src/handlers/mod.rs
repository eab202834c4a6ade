pub mod admin;
pub mod maintenance;
pub mod queue;
