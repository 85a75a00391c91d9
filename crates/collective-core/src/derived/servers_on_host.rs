// ── Servers-on-host derived collection ──

use std::fmt;
use std::sync::Arc;

use super::view::ServerView;
use crate::config::ResolveConfig;
use crate::error::CoreError;
use crate::model::{Host, Origin, ResourceId, ResourceKind, Server, Tally};
use crate::observe::{DestroyObserver, ListChange, ListObserver, Observer, TallyObserver};
use crate::registry::ResourceManager;

/// Live view of the servers running on one host.
///
/// Both an observer (of the host) and an observable (to its own
/// subscribers): host changes are re-derived and re-published under this
/// collection's own identity, forming a propagation chain down to leaf
/// consumers. Owns no independent source of truth.
pub struct ServersOnHost {
    view: Arc<ServerView>,
    parent: Arc<Host>,
}

impl ServersOnHost {
    /// Derive a collection from `parent` and subscribe to it.
    ///
    /// Fails fast when the parent is already destroyed or when its
    /// servers tally does not account for `initial` — a partially
    /// constructed collection is never exposed.
    pub fn new(
        parent: &Arc<Host>,
        initial: Vec<Arc<Server>>,
        manager: Arc<dyn ResourceManager>,
    ) -> Result<Arc<Self>, CoreError> {
        Self::with_config(parent, initial, manager, ResolveConfig::default())
    }

    pub fn with_config(
        parent: &Arc<Host>,
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
            ResourceKind::ServersOnHost,
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

    /// Detach from the parent. Safe to call more than once; the second
    /// and later calls find nothing to remove.
    pub fn destroy(self: &Arc<Self>) {
        let as_observer: Arc<dyn Observer> = Arc::clone(self) as Arc<dyn Observer>;
        self.parent.unsubscribe(&as_observer);
    }
}

// Manual impl: the inner view holds an `Arc<dyn ResourceManager>`,
// which has no `Debug` bound.
impl fmt::Debug for ServersOnHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServersOnHost")
            .field("id", self.view.id())
            .field("parent", self.parent.id())
            .finish_non_exhaustive()
    }
}

impl Observer for ServersOnHost {
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

impl TallyObserver for ServersOnHost {
    fn on_tally_change(&self, _origin: &Origin, new: &Tally, _old: &Tally) -> Result<(), CoreError> {
        self.view.handle_parent_tally(new);
        Ok(())
    }
}

impl ListObserver for ServersOnHost {
    fn on_servers_change(
        &self,
        _origin: &Origin,
        change: &ListChange<String>,
    ) -> Result<(), CoreError> {
        self.view.handle_parent_list(&change.added, &change.removed);
        Ok(())
    }
}

impl DestroyObserver for ServersOnHost {
    fn on_destroyed(&self, _origin: &Origin) -> Result<(), CoreError> {
        // Forward teardown only: the parent is already gone, so there
        // is nothing to unsubscribe from.
        self.view.handle_parent_destroyed();
        Ok(())
    }
}
