// ── Shared core of the servers-on-parent collections ──
//
// ServersOnHost and ServersOnRuntime are the same pattern over
// different parents: copy the parent's servers tally, hold the resolved
// member objects, and re-derive incrementally as the parent changes.
// This type carries that shared behavior; the public wrappers own the
// parent handle and the Observer impl.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::config::ResolveConfig;
use crate::error::CoreError;
use crate::events::ListDelta;
use crate::model::{Origin, ResourceId, ResourceKind, Server, Tally};
use crate::observe::{Notifier, Observer, apply_delta};
use crate::registry::ResourceManager;

pub(crate) struct ServerView {
    notifier: Notifier,
    manager: Arc<dyn ResourceManager>,
    config: ResolveConfig,
    inner: Mutex<ViewState>,
    destroyed: AtomicBool,
}

struct ViewState {
    tally: Tally,
    members: Vec<Arc<Server>>,
}

impl ServerView {
    pub(crate) fn new(
        kind: ResourceKind,
        parent_id: &ResourceId,
        parent_tally: Tally,
        initial: Vec<Arc<Server>>,
        manager: Arc<dyn ResourceManager>,
        config: ResolveConfig,
    ) -> Result<Self, CoreError> {
        if !parent_tally.accounts_for(initial.len()) {
            return Err(CoreError::validation(format!(
                "{} derived from \"{parent_id}\" created with a tally that does not account for the initial server list",
                kind.tag()
            )));
        }
        Ok(Self {
            notifier: Notifier::new(ResourceId::derived(kind, parent_id), kind),
            manager,
            config,
            inner: Mutex::new(ViewState {
                tally: parent_tally,
                members: initial,
            }),
            destroyed: AtomicBool::new(false),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub(crate) fn id(&self) -> &ResourceId {
        self.notifier.id()
    }

    pub(crate) fn origin(&self) -> &Origin {
        self.notifier.origin()
    }

    pub(crate) fn tally(&self) -> Tally {
        self.lock().tally
    }

    pub(crate) fn members(&self) -> Vec<Arc<Server>> {
        self.lock().members.clone()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribe(&self, observer: &Arc<dyn Observer>) {
        self.notifier.subscribe(observer);
    }

    pub(crate) fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        self.notifier.unsubscribe(observer);
    }

    // ── Parent-change handling ───────────────────────────────────────

    /// Copy a parent tally change into this view and re-publish it
    /// under this view's own origin.
    pub(crate) fn handle_parent_tally(&self, new: &Tally) {
        if self.is_destroyed() {
            return;
        }
        let old = {
            let mut inner = self.lock();
            std::mem::replace(&mut inner.tally, *new)
        };
        self.notifier.notify_tally(new, &old);
    }

    /// Re-derive the member list from a parent id-list change.
    ///
    /// Removal-only changes are applied and announced synchronously.
    /// When additions are present, the entire notification (removals
    /// included) waits until the added ids have been resolved to full
    /// server objects, so subscribers see the change later than the
    /// parent's own subscribers did.
    pub(crate) fn handle_parent_list(self: &Arc<Self>, added: &[String], removed: &[String]) {
        if self.is_destroyed() || (added.is_empty() && removed.is_empty()) {
            return;
        }

        if added.is_empty() {
            let change = {
                let mut inner = self.lock();
                apply_delta(
                    &mut inner.members,
                    &ListDelta {
                        added: Vec::new(),
                        removed: removed.to_vec(),
                        changed: Vec::new(),
                    },
                )
            };
            if let Some(change) = &change {
                self.notifier.notify_members(change);
            }
            return;
        }

        // Resolution needs a runtime to defer into. Without one the
        // change cannot be applied, so it is reported the same way a
        // failed resolution is.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            let err = CoreError::Internal(
                "no async runtime available to resolve added servers".to_owned(),
            );
            error!(collection = %self.id(), error = %err, "failed to resolve added servers");
            self.notifier.notify_resolve_error(&err);
            return;
        };

        let view = Arc::clone(self);
        let added = added.to_vec();
        let removed = removed.to_vec();
        handle.spawn(async move {
            let resolved =
                match tokio::time::timeout(view.config.timeout, view.manager.get_servers(&added))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(CoreError::ResolveTimeout {
                        timeout_secs: view.config.timeout.as_secs(),
                    }),
                };

            // The parent may have been destroyed while the resolution
            // was in flight; a late arrival must not mutate or notify.
            if view.is_destroyed() {
                debug!(
                    collection = %view.id(),
                    "resolution completed after destroy; dropping"
                );
                return;
            }

            match resolved {
                Ok(servers) => {
                    let change = {
                        let mut inner = view.lock();
                        apply_delta(
                            &mut inner.members,
                            &ListDelta {
                                added: servers,
                                removed,
                                changed: Vec::new(),
                            },
                        )
                    };
                    if let Some(change) = &change {
                        view.notifier.notify_members(change);
                    }
                }
                Err(err) => {
                    error!(
                        collection = %view.id(),
                        error = %err,
                        "failed to resolve added servers"
                    );
                    view.notifier.notify_resolve_error(&err);
                }
            }
        });
    }

    /// Parent teardown: mark destroyed and cascade `on_destroyed` to
    /// this view's own subscribers, exactly once.
    pub(crate) fn handle_parent_destroyed(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(collection = %self.id(), "derived collection destroyed");
        self.notifier.notify_destroyed();
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
