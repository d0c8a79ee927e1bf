pub mod config;
pub mod packet;
pub mod schema;
pub mod stats;
