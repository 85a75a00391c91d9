// ── Subscriber bookkeeping and fan-out ──
//
// Each resource embeds a Notifier instead of inheriting notification
// behavior. The notifier owns the subscriber list exclusively; observers
// interact with it only through subscribe/unsubscribe.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use super::{ListChange, Observer};
use crate::error::CoreError;
use crate::model::{AlertSummary, AppState, Origin, ResourceId, ResourceKind, RuntimeRef, Server, Status, Tally};

/// Owns the subscriber list and the fan-out plumbing for one resource.
///
/// Fan-out iterates over a snapshot of the subscriber list taken at
/// dispatch start, so an observer subscribing or unsubscribing from
/// within its own handler never corrupts the iteration, and every other
/// subscriber in that dispatch is still delivered exactly once.
#[derive(Debug)]
pub struct Notifier {
    origin: Origin,
    subscribers: Mutex<Vec<Weak<dyn Observer>>>,
}

impl Notifier {
    pub fn new(id: ResourceId, kind: ResourceKind) -> Self {
        Self {
            origin: Origin::new(id, kind),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn id(&self) -> &ResourceId {
        &self.origin.id
    }

    // ── Subscription bookkeeping ─────────────────────────────────────

    /// Append an observer. No de-duplication is performed: subscribing
    /// the same observer twice means it is delivered twice.
    pub fn subscribe(&self, observer: &Arc<dyn Observer>) {
        self.lock().push(Arc::downgrade(observer));
        debug!(
            observable = %self.origin.id,
            observer = observer.observer_id(),
            "subscribed"
        );
    }

    /// Remove the first matching subscription. A no-op (not an error)
    /// when the observer is not subscribed.
    pub fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        let target = Arc::as_ptr(observer);
        let mut subscribers = self.lock();
        if let Some(pos) = subscribers
            .iter()
            .position(|weak| std::ptr::addr_eq(weak.as_ptr(), target))
        {
            subscribers.remove(pos);
            debug!(
                observable = %self.origin.id,
                observer = observer.observer_id(),
                "unsubscribed"
            );
        }
    }

    /// Number of live subscriptions (dropped observers excluded).
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    // ── Typed fan-out ────────────────────────────────────────────────

    pub fn notify_state(&self, new: Status, old: Status) {
        self.dispatch("on_state_change", |observer| {
            observer
                .as_state()
                .map(|o| o.on_state_change(&self.origin, new, old))
        });
    }

    pub fn notify_cluster(&self, new: Option<&str>, old: Option<&str>) {
        self.dispatch("on_cluster_change", |observer| {
            observer
                .as_state()
                .map(|o| o.on_cluster_change(&self.origin, new, old))
        });
    }

    pub fn notify_tally(&self, new: &Tally, old: &Tally) {
        self.dispatch("on_tally_change", |observer| {
            observer
                .as_tally()
                .map(|o| o.on_tally_change(&self.origin, new, old))
        });
    }

    pub fn notify_servers(&self, change: &ListChange<String>) {
        self.dispatch("on_servers_change", |observer| {
            observer
                .as_list()
                .map(|o| o.on_servers_change(&self.origin, change))
        });
    }

    pub fn notify_apps(&self, change: &ListChange<AppState>) {
        self.dispatch("on_apps_change", |observer| {
            observer
                .as_list()
                .map(|o| o.on_apps_change(&self.origin, change))
        });
    }

    pub fn notify_runtimes(&self, change: &ListChange<RuntimeRef>) {
        self.dispatch("on_runtimes_change", |observer| {
            observer
                .as_list()
                .map(|o| o.on_runtimes_change(&self.origin, change))
        });
    }

    pub fn notify_members(&self, change: &ListChange<Arc<Server>>) {
        self.dispatch("on_members_change", |observer| {
            observer
                .as_members()
                .map(|o| o.on_members_change(&self.origin, change))
        });
    }

    pub fn notify_alerts(&self, new: AlertSummary, old: AlertSummary) {
        self.dispatch("on_alerts_change", |observer| {
            observer
                .as_alerts()
                .map(|o| o.on_alerts_change(&self.origin, new, old))
        });
    }

    pub fn notify_destroyed(&self) {
        self.dispatch("on_destroyed", |observer| {
            observer
                .as_destroy()
                .map(|o| o.on_destroyed(&self.origin))
        });
    }

    pub fn notify_resolve_error(&self, error: &CoreError) {
        self.dispatch("on_resolve_error", |observer| {
            observer
                .as_resolve_errors()
                .map(|o| o.on_resolve_error(&self.origin, error))
        });
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn Observer>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot the subscriber list, pruning entries whose observer was
    /// dropped without unsubscribing.
    fn snapshot(&self) -> Vec<Arc<dyn Observer>> {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|weak| weak.strong_count() > 0);
        if subscribers.len() < before {
            debug!(
                observable = %self.origin.id,
                pruned = before - subscribers.len(),
                "pruned dead subscriptions"
            );
        }
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    /// One fan-out. `call` returns `None` when the observer lacks the
    /// capability for this notification kind (skipped silently). A
    /// handler failure is logged and delivery continues.
    fn dispatch<F>(&self, method: &'static str, call: F)
    where
        F: Fn(&dyn Observer) -> Option<Result<(), CoreError>>,
    {
        // The snapshot holds strong references for the duration of the
        // dispatch; the lock is NOT held while handlers run.
        for observer in self.snapshot() {
            match call(observer.as_ref()) {
                None | Some(Ok(())) => {}
                Some(Err(error)) => warn!(
                    observable = %self.origin.id,
                    observer = observer.observer_id(),
                    method,
                    error = %error,
                    "notification handler failed; continuing fan-out"
                ),
            }
        }
    }
}
