// ── Domain model ──
//
// Identity, status/tally value types, and the concrete observable
// resources (Host, Server, Cluster, Runtime). Each resource embeds a
// `Notifier` and is mutated only through `apply()`.

mod cluster;
mod host;
mod id;
mod runtime;
mod server;
mod status;
mod supporting;
mod tally;

pub use cluster::{Cluster, ClusterSnapshot};
pub use host::{Host, HostSnapshot};
pub use id::{Origin, ResourceId, ResourceKind};
pub use runtime::{Runtime, RuntimeSnapshot};
pub use server::{Server, ServerSnapshot};
pub use status::Status;
pub use supporting::{AlertSummary, AppState, RuntimeRef, RuntimeType};
pub use tally::{Tally, Tracked};
