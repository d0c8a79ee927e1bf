pub mod driver;
pub mod manager;
pub mod replay;
pub mod sink;
