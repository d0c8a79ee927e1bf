//! Packet filtering engine: field validation, rules and the committed
//! filter set

pub mod rule;
pub mod set;
pub mod validator;
