//! Core types for service-call dispatch.
//!
//! This module provides foundational types used throughout the crate:
//! - **IDs**: `RequestId` and the per-connection `IdGenerator`
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for connections and observability

mod config;
mod errors;
mod ids;

pub use config::{Config, ConnectionConfig, ObservabilityConfig};
pub use errors::{Error, Result};
pub use ids::{IdGenerator, RequestId};
