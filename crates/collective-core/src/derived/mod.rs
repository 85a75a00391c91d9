// ── Derived collections ──
//
// Computed views over a single parent resource, kept incrementally in
// sync through a subscription to that parent. Each is simultaneously an
// Observer (of the parent) and an observable (to its own subscribers).

mod servers_on_cluster;
mod servers_on_host;
mod servers_on_runtime;
mod view;

pub use servers_on_cluster::ServersOnCluster;
pub use servers_on_host::ServersOnHost;
pub use servers_on_runtime::ServersOnRuntime;
