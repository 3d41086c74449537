//! Topology logic between `labwire-api` and its consumers.
//!
//! - **[`Workbench`]**: facade owning the shared [`Session`] and exposing
//!   every lab, node, interface and link operation with errors mapped to
//!   [`CoreError`].
//!
//! - **[`InterfaceResolver`]**: enumerates a node's interfaces and picks the
//!   first physical one not yet connected, stopping at the first match.
//!
//! - **[`LinkNegotiator`]**: creates links by trying each [`LinkPayload`]
//!   variant in preference order until the server accepts one.
//!
//! - **[`ReadinessPoller`]**: samples node states after a lab start until
//!   every node is up or a deadline passes.

pub mod config;
pub mod error;
pub mod negotiator;
pub mod readiness;
pub mod resolver;
pub mod workbench;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::CoreError;
pub use negotiator::{LinkNegotiator, LinkOutcome, LinkPayload, VariantAttempt};
pub use readiness::{
    DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, Readiness, ReadinessPoller, ReadinessSample,
    SampleState,
};
pub use resolver::{InterfaceDescriptor, InterfaceKind, InterfaceResolver};
pub use workbench::Workbench;

// Session-layer types collaborators need alongside the core.
pub use labwire_api::{
    ApiRequest, Identifier, LabDetail, NewNode, NodeDefinition, NodeDetail, Session,
};
