//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: in-process entity store implementing every repository port
//! - **events_api**: reqwest client for the external events service
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod events_api;
pub mod memory;
