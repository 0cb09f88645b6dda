//! Dispatch / write path.
//!
//! Many builders share one [`Connection`]. The transport sits behind a
//! `tokio::sync::Mutex`, so at most one serialize-and-write is in flight per
//! connection and frames never interleave on the wire. Both the lock wait and
//! the write itself are raced against the caller's [`CallContext`].
//!
//! ```text
//!   builder A ─┐                        ┌───────────────┐
//!   builder B ─┼─► dispatch() ─► lock ─►│   Transport   │─► wire
//!   builder C ─┘   (ctx.check,          └───────────────┘
//!                   serialize)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::context::CallContext;
use crate::envelope::{ServiceData, ServiceRequest};
use crate::services::DomainKind;
use crate::transport::Transport;
use crate::types::{ConnectionConfig, Error, IdGenerator, Result};

struct Shared {
    transport: Mutex<Box<dyn Transport>>,
    ids: IdGenerator,
    poisoned: AtomicBool,
    config: ConnectionConfig,
}

/// Shared handle to one open connection.
///
/// Cheap to clone; clones refer to the same transport, write lock and id
/// counter. Dropping handles never closes anything on its own.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("next_id", &self.shared.ids.peek())
            .field("poisoned", &self.is_poisoned())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, ConnectionConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: ConnectionConfig) -> Self {
        let ids = IdGenerator::starting_at(config.first_request_id);
        Self::with_ids(transport, ids, config)
    }

    /// Share an id space with other traffic on the same socket.
    pub fn with_ids(
        transport: impl Transport + 'static,
        ids: IdGenerator,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport: Mutex::new(Box::new(transport)),
                ids,
                poisoned: AtomicBool::new(false),
                config,
            }),
        }
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.shared.ids
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// True once a write has been abandoned partway.
    pub fn is_poisoned(&self) -> bool {
        self.shared.poisoned.load(Ordering::Acquire)
    }

    /// Allocate an envelope for this connection.
    pub fn request(&self, entity_id: &str) -> ServiceRequest {
        ServiceRequest::new(&self.shared.ids, entity_id)
    }

    /// Table-driven call: validate `service` against `kind`'s action table,
    /// then build and dispatch the envelope.
    pub async fn call(
        &self,
        ctx: &CallContext,
        kind: DomainKind,
        service: &str,
        entity_id: Option<&str>,
        data: Option<ServiceData>,
    ) -> Result<()> {
        let entity_id = entity_id.unwrap_or_default();
        if let Some(spec) = kind.action(service) {
            if spec.target && entity_id.is_empty() {
                return Err(Error::validation(format!(
                    "{}.{} requires an entity id",
                    kind, service
                )));
            }
            if !spec.target && !entity_id.is_empty() {
                return Err(Error::validation(format!(
                    "{}.{} does not take an entity id",
                    kind, service
                )));
            }
            if !spec.data && data.as_ref().is_some_and(|d| !d.is_empty()) {
                return Err(Error::validation(format!(
                    "{}.{} does not take service data",
                    kind, service
                )));
            }
        } else if !kind.accepts_any_service() {
            return Err(Error::validation(format!(
                "unknown service {}.{}",
                kind, service
            )));
        } else if service.is_empty() {
            return Err(Error::validation(format!("{} requires a service name", kind)));
        }

        let mut request = self
            .request(entity_id)
            .with_domain(kind.domain())
            .with_service(service);
        if let Some(data) = data {
            request = request.with_service_data(data);
        }
        dispatch(&request, self, ctx).await
    }
}

/// Serialize `request` and write it on `conn`.
///
/// - An already-cancelled or expired context never reaches the transport.
/// - Waiting for the write lock aborts as soon as the context ends.
/// - A write abandoned because the context ended poisons the connection:
///   the wire may hold a partial frame, so later writes are refused.
///
/// Fire-and-forget: `Ok(())` means the frame was written, not acknowledged.
pub async fn dispatch(request: &ServiceRequest, conn: &Connection, ctx: &CallContext) -> Result<()> {
    if let Err(e) = ctx.check() {
        tracing::debug!(
            id = %request.id,
            domain = %request.domain,
            service = %request.service,
            code = e.code(),
            "dispatch skipped: {}",
            e
        );
        return Err(e);
    }

    request.validate()?;
    let frame = request.to_json()?;
    let limit = conn.shared.config.max_message_bytes;
    if frame.len() > limit {
        return Err(Error::validation(format!(
            "envelope is {} bytes, limit is {}",
            frame.len(),
            limit
        )));
    }

    let mut transport = tokio::select! {
        biased;
        e = ctx.done() => {
            tracing::debug!(id = %request.id, code = e.code(), "dispatch abandoned waiting for write lock");
            return Err(e);
        }
        guard = conn.shared.transport.lock() => guard,
    };

    if conn.is_poisoned() {
        return Err(Error::ConnectionPoisoned);
    }

    let written = tokio::select! {
        biased;
        e = ctx.done() => {
            conn.shared.poisoned.store(true, Ordering::Release);
            tracing::error!(
                id = %request.id,
                domain = %request.domain,
                service = %request.service,
                "write interrupted by {}; connection poisoned",
                e.code()
            );
            return Err(e);
        }
        written = transport.send(&frame) => written,
    };
    drop(transport);

    match written {
        Ok(()) => {
            tracing::debug!(
                id = %request.id,
                domain = %request.domain,
                service = %request.service,
                "call_service dispatched"
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(
                id = %request.id,
                domain = %request.domain,
                service = %request.service,
                "transport write failed: {}",
                e
            );
            Err(Error::Transport(e))
        }
    }
}
