// ── Cluster resource ──
//
// A named group of servers. The id is the cluster name, the same value
// a member server carries in its `cluster` attribute.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::debug;

use super::id::{Origin, ResourceId, ResourceKind};
use super::status::Status;
use super::supporting::AlertSummary;
use super::tally::{Tally, Tracked};
use crate::error::CoreError;
use crate::events::ClusterEvent;
use crate::observe::{Notifier, Observer, apply_delta, diff_attribute, diff_tally};

/// Server-provided snapshot a cluster is created from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub id: String,
    pub state: Status,
    pub servers: Tracked<String>,
    #[serde(default)]
    pub alerts: AlertSummary,
}

#[derive(Debug)]
pub struct Cluster {
    notifier: Notifier,
    inner: Mutex<ClusterState>,
    destroyed: AtomicBool,
}

#[derive(Debug)]
struct ClusterState {
    state: Status,
    servers: Tracked<String>,
    alerts: AlertSummary,
}

impl Cluster {
    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Result<Arc<Self>, CoreError> {
        let id = ResourceId::new(snapshot.id);
        if id.is_empty() {
            return Err(CoreError::validation("cluster created without an id"));
        }
        if !snapshot.servers.is_consistent() {
            return Err(CoreError::validation(format!(
                "cluster \"{id}\" created with a servers tally that does not account for every tracked server"
            )));
        }
        Ok(Arc::new(Self {
            notifier: Notifier::new(id, ResourceKind::Cluster),
            inner: Mutex::new(ClusterState {
                state: snapshot.state,
                servers: snapshot.servers,
                alerts: snapshot.alerts,
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

    pub fn state(&self) -> Status {
        self.lock().state
    }

    pub fn servers_tally(&self) -> Tally {
        self.lock().servers.tally
    }

    pub fn server_ids(&self) -> Vec<String> {
        self.lock().servers.list.clone()
    }

    pub fn alerts(&self) -> AlertSummary {
        self.lock().alerts
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

    pub fn apply(&self, event: &ClusterEvent) {
        if self.is_destroyed() {
            debug!(cluster = %self.id(), "event for destroyed cluster dropped");
            return;
        }

        let (state_change, tally_change, servers_change, alerts_change) = {
            let mut inner = self.lock();
            let state_change = diff_attribute(&mut inner.state, event.state);
            let (tally_change, servers_change) = match &event.servers {
                Some(delta) => (
                    diff_tally(&mut inner.servers.tally, delta.up, delta.down, delta.unknown),
                    apply_delta(&mut inner.servers.list, &delta.to_list_delta()),
                ),
                None => (None, None),
            };
            let alerts_change = diff_attribute(&mut inner.alerts, event.alerts);
            (state_change, tally_change, servers_change, alerts_change)
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
        if let Some((new, old)) = alerts_change {
            self.notifier.notify_alerts(new, old);
        }
    }

    /// Mark the cluster destroyed and fan out `on_destroyed` once.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(cluster = %self.id(), "cluster destroyed");
        self.notifier.notify_destroyed();
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::TalliedDelta;

    fn snapshot() -> ClusterSnapshot {
        ClusterSnapshot {
            id: "cluster1".into(),
            state: Status::Started,
            servers: Tracked::new(Tally::new(2, 0, 0), vec!["s1".into(), "s2".into()]),
            alerts: AlertSummary::default(),
        }
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut bad = snapshot();
        bad.id = " ".into();
        assert!(Cluster::from_snapshot(bad).is_err());
    }

    #[test]
    fn construction_validates_servers_tally() {
        let mut bad = snapshot();
        bad.servers.tally = Tally::new(1, 0, 0);
        let err = Cluster::from_snapshot(bad).unwrap_err();
        assert!(err.to_string().contains("does not account"));
    }

    #[test]
    fn servers_delta_updates_tally_and_list() {
        let cluster = Cluster::from_snapshot(snapshot()).unwrap();
        cluster.apply(&ClusterEvent {
            servers: Some(TalliedDelta {
                up: Some(1),
                down: Some(1),
                unknown: Some(0),
                removed: vec!["s1".into()],
                added: vec!["s3".into()],
                ..TalliedDelta::default()
            }),
            ..ClusterEvent::default()
        });
        assert_eq!(cluster.servers_tally(), Tally::new(1, 1, 0));
        assert_eq!(cluster.server_ids(), vec!["s2".to_owned(), "s3".to_owned()]);
    }

    #[test]
    fn events_after_destroy_are_dropped() {
        let cluster = Cluster::from_snapshot(snapshot()).unwrap();
        cluster.destroy();
        cluster.destroy();
        cluster.apply(&ClusterEvent {
            state: Some(Status::Stopped),
            ..ClusterEvent::default()
        });
        assert!(cluster.is_destroyed());
        assert_eq!(cluster.state(), Status::Started);
    }

    #[test]
    fn snapshot_parses_from_json() {
        let snap: ClusterSnapshot = serde_json::from_str(
            r#"{
                "id": "cluster1",
                "state": "STARTED",
                "servers": {"up": 2, "down": 0, "unknown": 0, "list": ["s1", "s2"]}
            }"#,
        )
        .unwrap();
        let cluster = Cluster::from_snapshot(snap).unwrap();
        assert_eq!(cluster.servers_tally(), Tally::new(2, 0, 0));
        assert!(cluster.alerts().is_clear());
    }
}
