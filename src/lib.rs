//! Packet monitor for the HDL Buspro and SmartBus home-automation buses.
//!
//! Decoded packets from a bus driver are kept in a session history and
//! shown through a display buffer, filtered by user-defined rules.

pub mod api;
pub mod capture;
pub mod display;
pub mod filter;
pub mod models;
pub mod utils;
