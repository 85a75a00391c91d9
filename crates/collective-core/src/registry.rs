// ── Resource registry ──
//
// In-memory canonical store of live resources, keyed by id, plus the
// resolver seam derived collections use to turn added child ids into
// full objects.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Cluster, Host, ResourceKind, Runtime, Server};

/// Resolves server ids to live server objects.
///
/// Injected into derived collections; resolution is asynchronous because
/// a production implementation may need a network round-trip for ids it
/// has not seen yet.
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    async fn get_servers(&self, ids: &[String]) -> Result<Vec<Arc<Server>>, CoreError>;
}

/// Canonical store of live resource handles.
///
/// Lock-free concurrent maps, one per resource kind. Everything holding
/// an `Arc` to a stored resource sees the same instance, so a change
/// applied through the registry reaches every subscriber.
#[derive(Default)]
pub struct ResourceRegistry {
    hosts: DashMap<String, Arc<Host>>,
    servers: DashMap<String, Arc<Server>>,
    clusters: DashMap<String, Arc<Cluster>>,
    runtimes: DashMap<String, Arc<Runtime>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insertion ────────────────────────────────────────────────────

    /// Register a host, returning the previously registered instance
    /// for that id, if any.
    pub fn insert_host(&self, host: Arc<Host>) -> Option<Arc<Host>> {
        self.hosts.insert(host.id().as_str().to_owned(), host)
    }

    pub fn insert_server(&self, server: Arc<Server>) -> Option<Arc<Server>> {
        self.servers.insert(server.id().as_str().to_owned(), server)
    }

    pub fn insert_cluster(&self, cluster: Arc<Cluster>) -> Option<Arc<Cluster>> {
        self.clusters
            .insert(cluster.id().as_str().to_owned(), cluster)
    }

    pub fn insert_runtime(&self, runtime: Arc<Runtime>) -> Option<Arc<Runtime>> {
        self.runtimes
            .insert(runtime.id().as_str().to_owned(), runtime)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn host(&self, id: &str) -> Option<Arc<Host>> {
        self.hosts.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn server(&self, id: &str) -> Option<Arc<Server>> {
        self.servers.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn cluster(&self, id: &str) -> Option<Arc<Cluster>> {
        self.clusters.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn runtime(&self, id: &str) -> Option<Arc<Runtime>> {
        self.runtimes.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn runtime_count(&self) -> usize {
        self.runtimes.len()
    }

    // ── Removal ──────────────────────────────────────────────────────
    //
    // Eviction destroys the resource: subscribers of the evicted
    // instance receive `on_destroyed` and derived collections cascade
    // their own teardown.

    pub fn remove_host(&self, id: &str) -> Option<Arc<Host>> {
        let removed = self.hosts.remove(id).map(|(_, host)| host);
        if let Some(host) = &removed {
            debug!(host = %host.id(), "host evicted from registry");
            host.destroy();
        }
        removed
    }

    pub fn remove_server(&self, id: &str) -> Option<Arc<Server>> {
        let removed = self.servers.remove(id).map(|(_, server)| server);
        if let Some(server) = &removed {
            debug!(server = %server.id(), "server evicted from registry");
            server.destroy();
        }
        removed
    }

    pub fn remove_cluster(&self, id: &str) -> Option<Arc<Cluster>> {
        let removed = self.clusters.remove(id).map(|(_, cluster)| cluster);
        if let Some(cluster) = &removed {
            debug!(cluster = %cluster.id(), "cluster evicted from registry");
            cluster.destroy();
        }
        removed
    }

    pub fn remove_runtime(&self, id: &str) -> Option<Arc<Runtime>> {
        let removed = self.runtimes.remove(id).map(|(_, runtime)| runtime);
        if let Some(runtime) = &removed {
            debug!(runtime = %runtime.id(), "runtime evicted from registry");
            runtime.destroy();
        }
        removed
    }
}

#[async_trait]
impl ResourceManager for ResourceRegistry {
    /// All-or-nothing resolution: one unknown id fails the whole batch,
    /// which the requesting derived collection reports as a resolve
    /// error rather than appending a partial set.
    async fn get_servers(&self, ids: &[String]) -> Result<Vec<Arc<Server>>, CoreError> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match self.server(id) {
                Some(server) => resolved.push(server),
                None => {
                    return Err(CoreError::NotFound {
                        kind: ResourceKind::Server,
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(resolved)
    }
}
