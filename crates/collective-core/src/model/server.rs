// ── Server resource ──

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::debug;

use super::id::{Origin, ResourceId, ResourceKind};
use super::status::Status;
use super::supporting::{AlertSummary, AppState};
use super::tally::{Tally, Tracked};
use crate::error::CoreError;
use crate::events::ServerEvent;
use crate::observe::{Notifier, Observer, apply_delta, diff_attribute, diff_tally};

/// Server-provided snapshot a server is created from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSnapshot {
    pub id: String,
    pub state: Status,
    #[serde(default)]
    pub cluster: Option<String>,
    pub apps: Tracked<AppState>,
    #[serde(default)]
    pub alerts: AlertSummary,
}

/// A managed server: state, optional cluster membership, deployed
/// applications (tally + object list), and an alert roll-up.
#[derive(Debug)]
pub struct Server {
    notifier: Notifier,
    inner: Mutex<ServerState>,
    destroyed: AtomicBool,
}

#[derive(Debug)]
struct ServerState {
    state: Status,
    cluster: Option<String>,
    apps: Tracked<AppState>,
    alerts: AlertSummary,
}

impl Server {
    pub fn from_snapshot(snapshot: ServerSnapshot) -> Result<Arc<Self>, CoreError> {
        let id = ResourceId::new(snapshot.id);
        if id.is_empty() {
            return Err(CoreError::validation("server created without an id"));
        }
        if !snapshot.apps.is_consistent() {
            return Err(CoreError::validation(format!(
                "server \"{id}\" created with an apps tally that does not account for every tracked application"
            )));
        }
        Ok(Arc::new(Self {
            notifier: Notifier::new(id, ResourceKind::Server),
            inner: Mutex::new(ServerState {
                state: snapshot.state,
                cluster: snapshot.cluster,
                apps: snapshot.apps,
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

    pub fn cluster(&self) -> Option<String> {
        self.lock().cluster.clone()
    }

    pub fn apps_tally(&self) -> Tally {
        self.lock().apps.tally
    }

    pub fn apps(&self) -> Vec<AppState> {
        self.lock().apps.list.clone()
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

    /// Apply one server-pushed mutation batch.
    ///
    /// An event with `cluster: Some(None)` clears the cluster (explicit
    /// null on the wire); `cluster: None` leaves it untouched.
    pub fn apply(&self, event: &ServerEvent) {
        if self.is_destroyed() {
            debug!(server = %self.id(), "event for destroyed server dropped");
            return;
        }

        let (state_change, cluster_change, tally_change, apps_change, alerts_change) = {
            let mut inner = self.lock();
            let state_change = diff_attribute(&mut inner.state, event.state);
            let cluster_change = diff_attribute(&mut inner.cluster, event.cluster.clone());
            let (tally_change, apps_change) = match &event.apps {
                Some(delta) => (
                    diff_tally(&mut inner.apps.tally, delta.up, delta.down, delta.unknown),
                    apply_delta(&mut inner.apps.list, &delta.to_list_delta()),
                ),
                None => (None, None),
            };
            let alerts_change = diff_attribute(&mut inner.alerts, event.alerts);
            (
                state_change,
                cluster_change,
                tally_change,
                apps_change,
                alerts_change,
            )
        };

        if let Some((new, old)) = state_change {
            self.notifier.notify_state(new, old);
        }
        if let Some((new, old)) = &cluster_change {
            self.notifier.notify_cluster(new.as_deref(), old.as_deref());
        }
        if let Some((new, old)) = &tally_change {
            self.notifier.notify_tally(new, old);
        }
        if let Some(change) = &apps_change {
            self.notifier.notify_apps(change);
        }
        if let Some((new, old)) = alerts_change {
            self.notifier.notify_alerts(new, old);
        }
    }

    /// Mark the server destroyed and fan out `on_destroyed` once.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(server = %self.id(), "server destroyed");
        self.notifier.notify_destroyed();
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::TalliedDelta;
    use crate::observe::{ListChange, ListObserver, StateObserver};

    fn snapshot() -> ServerSnapshot {
        ServerSnapshot {
            id: "hostA,/wlp/usr,server1".into(),
            state: Status::Started,
            cluster: Some("cluster1".into()),
            apps: Tracked::new(
                Tally::new(1, 0, 0),
                vec![AppState::new("app1", Status::Started)],
            ),
            alerts: AlertSummary::default(),
        }
    }

    #[derive(Default)]
    struct ClusterRecorder {
        changes: Mutex<Vec<(Option<String>, Option<String>)>>,
    }

    impl Observer for ClusterRecorder {
        fn observer_id(&self) -> &str {
            "cluster-recorder"
        }
        fn as_state(&self) -> Option<&dyn StateObserver> {
            Some(self)
        }
    }

    impl StateObserver for ClusterRecorder {
        fn on_state_change(
            &self,
            _origin: &Origin,
            _new: Status,
            _old: Status,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        fn on_cluster_change(
            &self,
            _origin: &Origin,
            new: Option<&str>,
            old: Option<&str>,
        ) -> Result<(), CoreError> {
            self.changes
                .lock()
                .unwrap()
                .push((new.map(str::to_owned), old.map(str::to_owned)));
            Ok(())
        }
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut bad = snapshot();
        bad.id = String::new();
        assert!(Server::from_snapshot(bad).is_err());
    }

    #[test]
    fn inconsistent_apps_tally_is_rejected() {
        let mut bad = snapshot();
        bad.apps.tally = Tally::new(2, 0, 0);
        let err = Server::from_snapshot(bad).unwrap_err();
        assert!(err.to_string().contains("apps tally"));
    }

    #[test]
    fn absent_cluster_key_leaves_cluster_untouched() {
        let server = Server::from_snapshot(snapshot()).unwrap();
        let recorder = Arc::new(ClusterRecorder::default());
        let as_observer: Arc<dyn Observer> = recorder.clone();
        server.subscribe(&as_observer);

        server.apply(&ServerEvent {
            state: Some(Status::Stopping),
            ..ServerEvent::default()
        });
        assert_eq!(server.cluster(), Some("cluster1".to_owned()));
        assert!(recorder.changes.lock().unwrap().is_empty());
    }

    #[test]
    fn explicit_null_clears_cluster() {
        let server = Server::from_snapshot(snapshot()).unwrap();
        let recorder = Arc::new(ClusterRecorder::default());
        let as_observer: Arc<dyn Observer> = recorder.clone();
        server.subscribe(&as_observer);

        server.apply(&ServerEvent {
            cluster: Some(None),
            ..ServerEvent::default()
        });
        assert_eq!(server.cluster(), None);
        assert_eq!(
            recorder.changes.lock().unwrap().as_slice(),
            &[(None, Some("cluster1".to_owned()))]
        );
    }

    #[test]
    fn app_list_update_replaces_changed_entries() {
        #[derive(Default)]
        struct AppsRecorder {
            changes: Mutex<Vec<ListChange<AppState>>>,
        }
        impl Observer for AppsRecorder {
            fn observer_id(&self) -> &str {
                "apps-recorder"
            }
            fn as_list(&self) -> Option<&dyn ListObserver> {
                Some(self)
            }
        }
        impl ListObserver for AppsRecorder {
            fn on_apps_change(
                &self,
                _origin: &Origin,
                change: &ListChange<AppState>,
            ) -> Result<(), CoreError> {
                self.changes.lock().unwrap().push(change.clone());
                Ok(())
            }
        }

        let server = Server::from_snapshot(snapshot()).unwrap();
        let recorder = Arc::new(AppsRecorder::default());
        let as_observer: Arc<dyn Observer> = recorder.clone();
        server.subscribe(&as_observer);

        server.apply(&ServerEvent {
            apps: Some(TalliedDelta {
                up: Some(0),
                down: Some(1),
                unknown: Some(0),
                changed: vec![AppState::new("app1", Status::Stopped)],
                ..TalliedDelta::default()
            }),
            ..ServerEvent::default()
        });

        assert_eq!(server.apps()[0].state, Status::Stopped);
        assert!(server.apps_tally().accounts_for(server.apps().len()));
        let changes = recorder.changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].changed[0].name, "app1");
    }

    #[test]
    fn snapshot_parses_from_json() {
        let snap: ServerSnapshot = serde_json::from_str(
            r#"{
                "id": "hostA,/wlp/usr,server1",
                "state": "STARTED",
                "apps": {"up": 1, "down": 0, "unknown": 0,
                         "list": [{"name": "app1", "state": "STARTED"}]}
            }"#,
        )
        .unwrap();
        let server = Server::from_snapshot(snap).unwrap();
        assert_eq!(server.cluster(), None);
        assert_eq!(server.apps().len(), 1);
    }
}
