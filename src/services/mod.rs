//! Domain command builders.
//!
//! One builder per controllable device family, each holding the same two
//! bindings: a shared [`Connection`] and a [`CallContext`]. Every action
//! reduces to the same four steps: allocate an envelope, stamp the fixed
//! domain and service, attach optional parameters, dispatch.
//!
//! The per-domain surface is data: `define_domains!` turns one table into
//! the [`DomainKind`] enum, a struct per domain, an `async fn` per action and
//! the [`ServiceSpec`] rows used for table-driven calls.

pub use domains::*;
pub use notify::NotifyRequest;

use serde::Serialize;
use std::fmt;

use crate::context::CallContext;
use crate::dispatch::{dispatch, Connection};
use crate::envelope::ServiceData;
use crate::types::Result;

/// One row of a domain's action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub service: &'static str,
    /// Takes a target entity id.
    pub target: bool,
    /// Accepts `service_data`.
    pub data: bool,
}

/// Capability shared by every domain builder.
pub trait Domain: Sized {
    const KIND: DomainKind;

    fn bind(conn: Connection, ctx: CallContext) -> Self;

    fn connection(&self) -> &Connection;

    fn context(&self) -> &CallContext;
}

/// Factory: bind a domain builder to a connection and context.
///
/// Pure construction; cannot fail and has no side effects.
pub fn build<D: Domain>(conn: &Connection, ctx: &CallContext) -> D {
    D::bind(conn.clone(), ctx.clone())
}

/// Shared action body.
pub(crate) async fn send_call(
    conn: &Connection,
    ctx: &CallContext,
    domain: &str,
    service: &str,
    entity_id: &str,
    data: Option<ServiceData>,
) -> Result<()> {
    let mut request = conn.request(entity_id).with_domain(domain).with_service(service);
    if let Some(data) = data {
        request = request.with_service_data(data);
    }
    dispatch(&request, conn, ctx).await
}

/// Generates the closed set of domain builders from one table.
///
/// ```text
/// field: Type => "domain" [open] {
///     /// docs
///     method => "service" (target, data);
/// }
/// ```
/// Shapes: `(target, data)`, `(target)`, `(data)`, `()`. `[open]` marks a
/// domain whose service names are chosen at runtime.
macro_rules! define_domains {
    // Literal tokens match before metavariables.
    (@has target; target $($rest:ident)*) => { true };
    (@has data; data $($rest:ident)*) => { true };
    (@has open; open $($rest:ident)*) => { true };
    (@has $flag:ident; $_other:ident $($rest:ident)*) => { define_domains!(@has $flag; $($rest)*) };
    (@has $flag:ident;) => { false };

    (@method [$(#[$m:meta])*] $method:ident $service:literal [target data]) => {
        $(#[$m])*
        pub async fn $method(&self, entity_id: &str, data: Option<ServiceData>) -> Result<()> {
            self.send_targeted(entity_id, $service, data).await
        }
    };
    (@method [$(#[$m:meta])*] $method:ident $service:literal [target]) => {
        $(#[$m])*
        pub async fn $method(&self, entity_id: &str) -> Result<()> {
            self.send_targeted(entity_id, $service, None).await
        }
    };
    (@method [$(#[$m:meta])*] $method:ident $service:literal [data]) => {
        $(#[$m])*
        pub async fn $method(&self, data: Option<ServiceData>) -> Result<()> {
            self.send("", $service, data).await
        }
    };
    (@method [$(#[$m:meta])*] $method:ident $service:literal []) => {
        $(#[$m])*
        pub async fn $method(&self) -> Result<()> {
            self.send("", $service, None).await
        }
    };

    (
        $(
            $(#[$meta:meta])*
            $field:ident : $kind:ident => $domain:literal $([$flag:ident])? {
                $(
                    $(#[$ameta:meta])*
                    $method:ident => $service:literal ( $($shape:ident),* );
                )*
            }
        )*
    ) => {
        /// Closed set of domain builder kinds.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DomainKind {
            $( $kind, )*
        }

        impl DomainKind {
            pub const ALL: &'static [DomainKind] = &[ $( DomainKind::$kind, )* ];

            /// Wire `domain` tag.
            pub fn domain(self) -> &'static str {
                match self {
                    $( DomainKind::$kind => $domain, )*
                }
            }

            /// Fixed action table. Empty for open domains.
            pub fn actions(self) -> &'static [ServiceSpec] {
                match self {
                    $( DomainKind::$kind => &[
                        $( ServiceSpec {
                            service: $service,
                            target: define_domains!(@has target; $($shape)*),
                            data: define_domains!(@has data; $($shape)*),
                        }, )*
                    ], )*
                }
            }

            pub fn action(self, service: &str) -> Option<&'static ServiceSpec> {
                self.actions().iter().find(|spec| spec.service == service)
            }

            /// True when service names are not fixed (e.g. notify targets).
            pub fn accepts_any_service(self) -> bool {
                match self {
                    $( DomainKind::$kind => define_domains!(@has open; $($flag)?), )*
                }
            }
        }

        impl FromStr for DomainKind {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $( $domain => Ok(DomainKind::$kind), )*
                    other => Err(Error::validation(format!("unknown domain: {}", other))),
                }
            }
        }

        $(
            $(#[$meta])*
            #[derive(Debug, Clone)]
            pub struct $kind {
                conn: Connection,
                ctx: CallContext,
            }

            impl Domain for $kind {
                const KIND: DomainKind = DomainKind::$kind;

                fn bind(conn: Connection, ctx: CallContext) -> Self {
                    Self { conn, ctx }
                }

                fn connection(&self) -> &Connection {
                    &self.conn
                }

                fn context(&self) -> &CallContext {
                    &self.ctx
                }
            }

            impl $kind {
                pub(crate) async fn send(
                    &self,
                    entity_id: &str,
                    service: &str,
                    data: Option<ServiceData>,
                ) -> Result<()> {
                    send_call(&self.conn, &self.ctx, $domain, service, entity_id, data).await
                }

                // Target rows never fall back to a domain-wide call.
                #[allow(dead_code)]
                async fn send_targeted(
                    &self,
                    entity_id: &str,
                    service: &str,
                    data: Option<ServiceData>,
                ) -> Result<()> {
                    if entity_id.is_empty() {
                        return Err(Error::validation(format!(
                            "{}.{} requires an entity id",
                            $domain, service
                        )));
                    }
                    self.send(entity_id, service, data).await
                }

                $(
                    define_domains!(@method [$(#[$ameta])*] $method $service [$($shape)*]);
                )*
            }
        )*

        /// Every domain builder, bound to one connection and context.
        #[derive(Debug, Clone)]
        pub struct Services {
            $( pub $field: $kind, )*
        }

        impl Services {
            pub fn new(conn: &Connection, ctx: &CallContext) -> Self {
                Self {
                    $( $field: build::<$kind>(conn, ctx), )*
                }
            }
        }
    };
}

// Declared after the macro so its table can use it.
mod domains;
mod notify;

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}
