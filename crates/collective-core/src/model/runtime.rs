// ── Runtime resource ──
//
// A runtime installation on a host (e.g. a Liberty install dir). Tracks
// the servers running under it with the same tally + id-list shape a
// host uses, so the servers-on-runtime derived collection can observe
// it identically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::debug;

use super::id::{Origin, ResourceId, ResourceKind};
use super::status::Status;
use super::supporting::RuntimeType;
use super::tally::{Tally, Tracked};
use crate::error::CoreError;
use crate::events::RuntimeEvent;
use crate::observe::{Notifier, Observer, apply_delta, diff_attribute, diff_tally};

/// Server-provided snapshot a runtime is created from. The id is the
/// host name plus the installation path, e.g. `"hostA,/opt/wlp"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub id: String,
    pub runtime_type: RuntimeType,
    pub state: Status,
    pub servers: Tracked<String>,
}

#[derive(Debug)]
pub struct Runtime {
    notifier: Notifier,
    runtime_type: RuntimeType,
    inner: Mutex<RuntimeState>,
    destroyed: AtomicBool,
}

#[derive(Debug)]
struct RuntimeState {
    state: Status,
    servers: Tracked<String>,
}

impl Runtime {
    pub fn from_snapshot(snapshot: RuntimeSnapshot) -> Result<Arc<Self>, CoreError> {
        let id = ResourceId::new(snapshot.id);
        if id.is_empty() {
            return Err(CoreError::validation("runtime created without an id"));
        }
        if !snapshot.servers.is_consistent() {
            return Err(CoreError::validation(format!(
                "runtime \"{id}\" created with a servers tally that does not account for every tracked server"
            )));
        }
        Ok(Arc::new(Self {
            notifier: Notifier::new(id, ResourceKind::Runtime),
            runtime_type: snapshot.runtime_type,
            inner: Mutex::new(RuntimeState {
                state: snapshot.state,
                servers: snapshot.servers,
            }),
            destroyed: AtomicBool::new(false),
        }))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &ResourceId {
        self.notifier.id()
    }

    pub fn origin(&self) -> &Origin {
        self.notifier.origin()
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn state(&self) -> Status {
        self.lock().state
    }

    pub fn servers_tally(&self) -> Tally {
        self.lock().servers.tally
    }

    pub fn server_ids(&self) -> Vec<String> {
        self.lock().servers.list.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self, observer: &Arc<dyn Observer>) {
        self.notifier.subscribe(observer);
    }

    pub fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        self.notifier.unsubscribe(observer);
    }

    // ── Mutation ─────────────────────────────────────────────────────

    pub fn apply(&self, event: &RuntimeEvent) {
        if self.is_destroyed() {
            debug!(runtime = %self.id(), "event for destroyed runtime dropped");
            return;
        }

        let (state_change, tally_change, servers_change) = {
            let mut inner = self.lock();
            let state_change = diff_attribute(&mut inner.state, event.state);
            let (tally_change, servers_change) = match &event.servers {
                Some(delta) => (
                    diff_tally(&mut inner.servers.tally, delta.up, delta.down, delta.unknown),
                    apply_delta(&mut inner.servers.list, &delta.to_list_delta()),
                ),
                None => (None, None),
            };
            (state_change, tally_change, servers_change)
        };

        if let Some((new, old)) = state_change {
            self.notifier.notify_state(new, old);
        }
        if let Some((new, old)) = &tally_change {
            self.notifier.notify_tally(new, old);
        }
        if let Some(change) = &servers_change {
            self.notifier.notify_servers(change);
        }
    }

    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(runtime = %self.id(), "runtime destroyed");
        self.notifier.notify_destroyed();
    }

    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::TalliedDelta;

    fn snapshot() -> RuntimeSnapshot {
        RuntimeSnapshot {
            id: "hostA,/opt/wlp".into(),
            runtime_type: RuntimeType::Liberty,
            state: Status::Started,
            servers: Tracked::new(Tally::new(1, 0, 0), vec!["s1".into()]),
        }
    }

    #[test]
    fn construction_validates_servers_tally() {
        let mut bad = snapshot();
        bad.servers.list.push("s2".into());
        assert!(Runtime::from_snapshot(bad).is_err());
    }

    #[test]
    fn servers_delta_updates_tally_and_list() {
        let runtime = Runtime::from_snapshot(snapshot()).unwrap();
        runtime.apply(&RuntimeEvent {
            servers: Some(TalliedDelta {
                up: Some(2),
                down: Some(0),
                unknown: Some(0),
                added: vec!["s2".into()],
                ..TalliedDelta::default()
            }),
            ..RuntimeEvent::default()
        });
        assert_eq!(runtime.servers_tally(), Tally::new(2, 0, 0));
        assert_eq!(runtime.server_ids(), vec!["s1".to_owned(), "s2".to_owned()]);
        assert!(runtime.servers_tally().accounts_for(2));
    }
}
