//! Work orders
//!
//! - [`machine`] - pure transition rules
//! - [`WorkOrderService`] - persistence, CAS retry, event publication

pub mod machine;
mod service;

pub use service::WorkOrderService;
