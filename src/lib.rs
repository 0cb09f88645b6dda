//! # hass-dispatch - Home Assistant service-call dispatch core
//!
//! Issues `call_service` requests to a Home Assistant instance over one
//! long-lived, shared connection:
//! - Per-connection request id generation, unique under concurrency
//! - `call_service` envelope construction with field-omission rules
//! - Typed command builders for every controllable domain, from one table
//! - A write path that serializes concurrent writers and honors cancellation
//!
//! ## Architecture
//!
//! ```text
//!   Services / build::<MediaPlayer>(&conn, &ctx)
//!        │  .volume_set("media_player.kitchen", data)
//!        ▼
//!   ServiceRequest::new(ids, entity) ─► dispatch(req, conn, ctx)
//!                                          │ ctx.check()
//!                                          │ serialize
//!                                          │ lock ◄── select! ctx.done()
//!                                          ▼
//!                                     Transport::send ─► wire
//! ```
//!
//! Requests are fire-and-forget: replies on the socket belong to whoever
//! reads it.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod context;
pub mod dispatch;
pub mod envelope;
pub mod services;
pub mod transport;
pub mod types;

// Internal utilities
pub mod observability;

pub use context::CallContext;
pub use dispatch::{dispatch, Connection};
pub use envelope::{ServiceData, ServiceRequest};
pub use services::{build, Domain, DomainKind, Services};
pub use types::{Config, Error, Result};
