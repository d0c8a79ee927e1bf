pub mod filters;
pub mod monitor;
pub mod packets;
