//! Observable resource model and change propagation for collective
//! dashboards.
//!
//! This crate keeps live views of a collective (hosts, servers,
//! clusters, runtimes) in sync with server-reported state. Partial-update events
//! are diffed against current state and fanned out to subscribers;
//! derived collections re-derive themselves and re-publish under their
//! own identity, forming a propagation chain down to leaf consumers:
//!
//! - **Model** ([`model`]) — concrete resources ([`Host`], [`Server`],
//!   [`Cluster`], [`Runtime`]) built from server snapshots, each
//!   embedding a [`Notifier`] and mutated only through `apply()`.
//!
//! - **Observation** ([`observe`]) — per-kind observer capability
//!   traits, the subscriber-owning [`Notifier`] (snapshot-copy fan-out,
//!   per-handler fault isolation), and the pure diff primitives.
//!
//! - **Events** ([`events`]) — the partial-update wire contract:
//!   a present key means "changed", an absent key means "unchanged",
//!   never "cleared".
//!
//! - **Derived collections** ([`derived`]) — [`ServersOnHost`],
//!   [`ServersOnCluster`], and [`ServersOnRuntime`], filtered views
//!   that follow their parent.
//!   Removals propagate synchronously; additions are first resolved to
//!   full objects through a [`ResourceManager`], so their notification
//!   arrives a beat later.
//!
//! - **Registry** ([`registry`]) — canonical store of live resource
//!   handles and the default [`ResourceManager`] implementation.

pub mod config;
pub mod derived;
pub mod error;
pub mod events;
pub mod model;
pub mod observe;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ResolveConfig;
pub use derived::{ServersOnCluster, ServersOnHost, ServersOnRuntime};
pub use error::CoreError;
pub use events::{ClusterEvent, HostEvent, ListDelta, RuntimeEvent, ServerEvent, TalliedDelta};
pub use observe::{
    AlertObserver, DestroyObserver, ErrorObserver, Keyed, ListChange, ListObserver,
    MemberObserver, Notifier, Observer, StateObserver, TallyObserver,
};
pub use registry::{ResourceManager, ResourceRegistry};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AlertSummary, AppState, Cluster, ClusterSnapshot, Host, HostSnapshot, Origin, ResourceId,
    ResourceKind, Runtime, RuntimeRef, RuntimeSnapshot, RuntimeType, Server, ServerSnapshot,
    Status, Tally, Tracked,
};
