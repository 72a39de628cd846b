//! Application service layer.
//!
//! Services hold the delivery policy and orchestrate the configured
//! transports. They sit between the HTTP handlers and the transports.

mod orchestrator;

pub use orchestrator::DeliveryOrchestrator;
