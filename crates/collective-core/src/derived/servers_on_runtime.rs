// ── Servers-on-runtime derived collection ──

use std::fmt;
use std::sync::Arc;

use super::view::ServerView;
use crate::config::ResolveConfig;
use crate::error::CoreError;
use crate::model::{Origin, ResourceId, ResourceKind, Runtime, Server, Tally};
use crate::observe::{DestroyObserver, ListChange, ListObserver, Observer, TallyObserver};
use crate::registry::ResourceManager;

/// Live view of the servers running under one runtime installation.
///
/// Same propagation pattern as [`ServersOnHost`](super::ServersOnHost),
/// derived from a [`Runtime`] parent instead of a host.
pub struct ServersOnRuntime {
    view: Arc<ServerView>,
    parent: Arc<Runtime>,
}

impl ServersOnRuntime {
    pub fn new(
        parent: &Arc<Runtime>,
        initial: Vec<Arc<Server>>,
        manager: Arc<dyn ResourceManager>,
    ) -> Result<Arc<Self>, CoreError> {
        Self::with_config(parent, initial, manager, ResolveConfig::default())
    }

    pub fn with_config(
        parent: &Arc<Runtime>,
        initial: Vec<Arc<Server>>,
        manager: Arc<dyn ResourceManager>,
        config: ResolveConfig,
    ) -> Result<Arc<Self>, CoreError> {
        if parent.is_destroyed() {
            return Err(CoreError::ParentDestroyed {
                id: parent.id().clone(),
            });
        }
        let view = ServerView::new(
            ResourceKind::ServersOnRuntime,
            parent.id(),
            parent.servers_tally(),
            initial,
            manager,
            config,
        )?;
        let collection = Arc::new(Self {
            view: Arc::new(view),
            parent: Arc::clone(parent),
        });
        let as_observer: Arc<dyn Observer> = collection.clone();
        parent.subscribe(&as_observer);
        Ok(collection)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &ResourceId {
        self.view.id()
    }

    pub fn origin(&self) -> &Origin {
        self.view.origin()
    }

    pub fn tally(&self) -> Tally {
        self.view.tally()
    }

    pub fn members(&self) -> Vec<Arc<Server>> {
        self.view.members()
    }

    pub fn is_destroyed(&self) -> bool {
        self.view.is_destroyed()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self, observer: &Arc<dyn Observer>) {
        self.view.subscribe(observer);
    }

    pub fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        self.view.unsubscribe(observer);
    }

    /// Detach from the parent. Safe to call more than once.
    pub fn destroy(self: &Arc<Self>) {
        let as_observer: Arc<dyn Observer> = Arc::clone(self) as Arc<dyn Observer>;
        self.parent.unsubscribe(&as_observer);
    }
}

// Manual impl: the inner view holds an `Arc<dyn ResourceManager>`,
// which has no `Debug` bound.
impl fmt::Debug for ServersOnRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServersOnRuntime")
            .field("id", self.view.id())
            .field("parent", self.parent.id())
            .finish_non_exhaustive()
    }
}

impl Observer for ServersOnRuntime {
    fn observer_id(&self) -> &str {
        self.view.id().as_str()
    }

    fn as_tally(&self) -> Option<&dyn TallyObserver> {
        Some(self)
    }

    fn as_list(&self) -> Option<&dyn ListObserver> {
        Some(self)
    }

    fn as_destroy(&self) -> Option<&dyn DestroyObserver> {
        Some(self)
    }
}

impl TallyObserver for ServersOnRuntime {
    fn on_tally_change(&self, _origin: &Origin, new: &Tally, _old: &Tally) -> Result<(), CoreError> {
        self.view.handle_parent_tally(new);
        Ok(())
    }
}

impl ListObserver for ServersOnRuntime {
    fn on_servers_change(
        &self,
        _origin: &Origin,
        change: &ListChange<String>,
    ) -> Result<(), CoreError> {
        self.view.handle_parent_list(&change.added, &change.removed);
        Ok(())
    }
}

impl DestroyObserver for ServersOnRuntime {
    fn on_destroyed(&self, _origin: &Origin) -> Result<(), CoreError> {
        self.view.handle_parent_destroyed();
        Ok(())
    }
}
