pub mod identity;
pub mod maintenance_item;
pub mod setting;
pub mod ticket;
