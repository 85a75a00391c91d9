// ── Host resource ──

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::debug;

use super::id::{Origin, ResourceId, ResourceKind};
use super::status::Status;
use super::supporting::{AlertSummary, RuntimeRef};
use super::tally::{Tally, Tracked};
use crate::error::CoreError;
use crate::events::HostEvent;
use crate::observe::{Notifier, Observer, apply_delta, diff_attribute, diff_tally};

/// Server-provided snapshot a host is created from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub id: String,
    pub state: Status,
    pub servers: Tracked<String>,
    #[serde(default)]
    pub runtimes: Vec<RuntimeRef>,
    #[serde(default)]
    pub alerts: AlertSummary,
}

/// A collective host: state, tracked servers (tally + id list), tracked
/// runtimes, and an alert roll-up.
///
/// Mutation goes exclusively through [`Host::apply`]; every change is
/// diffed against current state and fanned out to subscribers. Direct
/// field access is deliberately impossible.
#[derive(Debug)]
pub struct Host {
    notifier: Notifier,
    inner: Mutex<HostState>,
    destroyed: AtomicBool,
}

#[derive(Debug)]
struct HostState {
    state: Status,
    servers: Tracked<String>,
    runtimes: Vec<RuntimeRef>,
    alerts: AlertSummary,
}

impl Host {
    /// Fail-fast construction from a snapshot. A blank id or a servers
    /// tally that does not account for the id list is rejected with a
    /// descriptive error, never silently defaulted.
    pub fn from_snapshot(snapshot: HostSnapshot) -> Result<Arc<Self>, CoreError> {
        let id = ResourceId::new(snapshot.id);
        if id.is_empty() {
            return Err(CoreError::validation("host created without an id"));
        }
        if !snapshot.servers.is_consistent() {
            return Err(CoreError::validation(format!(
                "host \"{id}\" created with a servers tally that does not account for every tracked server"
            )));
        }
        Ok(Arc::new(Self {
            notifier: Notifier::new(id, ResourceKind::Host),
            inner: Mutex::new(HostState {
                state: snapshot.state,
                servers: snapshot.servers,
                runtimes: snapshot.runtimes,
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

    pub fn runtimes(&self) -> Vec<RuntimeRef> {
        self.lock().runtimes.clone()
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

    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Apply one server-pushed mutation batch. Fields absent from the
    /// event keep their current value and fan out nothing.
    pub fn apply(&self, event: &HostEvent) {
        if self.is_destroyed() {
            debug!(host = %self.id(), "event for destroyed host dropped");
            return;
        }

        // Diff under the lock; fan out only after it is released, so a
        // handler may freely read this host or touch subscriptions.
        let (state_change, tally_change, servers_change, runtimes_change, alerts_change) = {
            let mut inner = self.lock();
            let state_change = diff_attribute(&mut inner.state, event.state);
            let (tally_change, servers_change) = match &event.servers {
                Some(delta) => (
                    diff_tally(&mut inner.servers.tally, delta.up, delta.down, delta.unknown),
                    apply_delta(&mut inner.servers.list, &delta.to_list_delta()),
                ),
                None => (None, None),
            };
            let runtimes_change = match &event.runtimes {
                Some(delta) => apply_delta(&mut inner.runtimes, delta),
                None => None,
            };
            let alerts_change = diff_attribute(&mut inner.alerts, event.alerts);
            (
                state_change,
                tally_change,
                servers_change,
                runtimes_change,
                alerts_change,
            )
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
        if let Some(change) = &runtimes_change {
            self.notifier.notify_runtimes(change);
        }
        if let Some((new, old)) = alerts_change {
            self.notifier.notify_alerts(new, old);
        }
    }

    /// Mark the host destroyed and fan out `on_destroyed` once.
    /// Subsequent calls are no-ops.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(host = %self.id(), "host destroyed");
        self.notifier.notify_destroyed();
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::TalliedDelta;
    use crate::observe::{ListChange, ListObserver, StateObserver, TallyObserver};
    use std::sync::atomic::AtomicUsize;

    fn snapshot() -> HostSnapshot {
        HostSnapshot {
            id: "hostA".into(),
            state: Status::Started,
            servers: Tracked::new(
                Tally::new(2, 1, 0),
                vec!["s1".into(), "s2".into(), "s3".into()],
            ),
            runtimes: Vec::new(),
            alerts: AlertSummary::default(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<(Status, Status)>>,
        tallies: Mutex<Vec<(Tally, Tally)>>,
        lists: Mutex<Vec<ListChange<String>>>,
        calls: AtomicUsize,
    }

    impl Observer for Recorder {
        fn observer_id(&self) -> &str {
            "recorder"
        }

        fn as_state(&self) -> Option<&dyn StateObserver> {
            Some(self)
        }

        fn as_tally(&self) -> Option<&dyn TallyObserver> {
            Some(self)
        }

        fn as_list(&self) -> Option<&dyn ListObserver> {
            Some(self)
        }
    }

    impl StateObserver for Recorder {
        fn on_state_change(
            &self,
            _origin: &Origin,
            new: Status,
            old: Status,
        ) -> Result<(), CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.states.lock().unwrap().push((new, old));
            Ok(())
        }
    }

    impl TallyObserver for Recorder {
        fn on_tally_change(
            &self,
            _origin: &Origin,
            new: &Tally,
            old: &Tally,
        ) -> Result<(), CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tallies.lock().unwrap().push((*new, *old));
            Ok(())
        }
    }

    impl ListObserver for Recorder {
        fn on_servers_change(
            &self,
            _origin: &Origin,
            change: &ListChange<String>,
        ) -> Result<(), CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lists.lock().unwrap().push(change.clone());
            Ok(())
        }
    }

    fn subscribed_host() -> (Arc<Host>, Arc<Recorder>) {
        let host = Host::from_snapshot(snapshot()).unwrap();
        let recorder = Arc::new(Recorder::default());
        let as_observer: Arc<dyn Observer> = recorder.clone();
        host.subscribe(&as_observer);
        (host, recorder)
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut bad = snapshot();
        bad.id = "  ".into();
        let err = Host::from_snapshot(bad).unwrap_err();
        assert!(err.to_string().contains("without an id"));
    }

    #[test]
    fn inconsistent_tally_is_rejected() {
        let mut bad = snapshot();
        bad.servers.tally = Tally::new(1, 0, 0);
        let err = Host::from_snapshot(bad).unwrap_err();
        assert!(err.to_string().contains("does not account"));
    }

    #[test]
    fn empty_event_mutates_and_notifies_nothing() {
        let (host, recorder) = subscribed_host();
        host.apply(&HostEvent::default());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(host.state(), Status::Started);
        assert_eq!(host.server_ids().len(), 3);
    }

    #[test]
    fn state_change_reports_new_and_old() {
        let (host, recorder) = subscribed_host();
        host.apply(&HostEvent {
            state: Some(Status::Stopping),
            ..HostEvent::default()
        });
        assert_eq!(host.state(), Status::Stopping);
        assert_eq!(
            recorder.states.lock().unwrap().as_slice(),
            &[(Status::Stopping, Status::Started)]
        );
    }

    #[test]
    fn tally_batch_arrives_as_one_notification() {
        let (host, recorder) = subscribed_host();
        host.apply(&HostEvent {
            servers: Some(TalliedDelta {
                up: Some(1),
                down: Some(2),
                unknown: Some(0),
                ..TalliedDelta::default()
            }),
            ..HostEvent::default()
        });
        let tallies = recorder.tallies.lock().unwrap();
        assert_eq!(tallies.as_slice(), &[(Tally::new(1, 2, 0), Tally::new(2, 1, 0))]);
    }

    #[test]
    fn tally_stays_consistent_with_list() {
        let (host, _recorder) = subscribed_host();
        host.apply(&HostEvent {
            servers: Some(TalliedDelta {
                up: Some(1),
                down: Some(1),
                unknown: Some(0),
                removed: vec!["s2".into()],
                ..TalliedDelta::default()
            }),
            ..HostEvent::default()
        });
        let tally = host.servers_tally();
        assert!(tally.accounts_for(host.server_ids().len()));
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn server_list_removal_is_synchronous() {
        let (host, recorder) = subscribed_host();
        host.apply(&HostEvent {
            servers: Some(TalliedDelta {
                removed: vec!["s2".into()],
                ..TalliedDelta::default()
            }),
            ..HostEvent::default()
        });
        let lists = recorder.lists.lock().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].new_list, vec!["s1".to_owned(), "s3".to_owned()]);
        assert_eq!(lists[0].removed, vec!["s2".to_owned()]);
    }

    #[test]
    fn destroy_is_idempotent() {
        #[derive(Default)]
        struct DestroyCounter(AtomicUsize);
        impl Observer for DestroyCounter {
            fn observer_id(&self) -> &str {
                "destroy-counter"
            }
            fn as_destroy(&self) -> Option<&dyn crate::observe::DestroyObserver> {
                Some(self)
            }
        }
        impl crate::observe::DestroyObserver for DestroyCounter {
            fn on_destroyed(&self, _origin: &Origin) -> Result<(), CoreError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let (host, _recorder) = subscribed_host();
        let counter = Arc::new(DestroyCounter::default());
        let as_observer: Arc<dyn Observer> = counter.clone();
        host.subscribe(&as_observer);

        host.destroy();
        host.destroy();
        assert!(host.is_destroyed());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn events_after_destroy_are_dropped() {
        let (host, recorder) = subscribed_host();
        host.destroy();
        host.apply(&HostEvent {
            state: Some(Status::Stopped),
            ..HostEvent::default()
        });
        assert_eq!(recorder.states.lock().unwrap().len(), 0);
        assert_eq!(host.state(), Status::Started);
    }

    #[test]
    fn snapshot_round_trips_from_json() {
        let snap: HostSnapshot = serde_json::from_str(
            r#"{
                "id": "hostA",
                "state": "STARTED",
                "servers": {"up": 2, "down": 1, "unknown": 0, "list": ["s1", "s2", "s3"]},
                "runtimes": [{"id": "hostA,/wlp", "runtimeType": "Liberty"}]
            }"#,
        )
        .unwrap();
        let host = Host::from_snapshot(snap).unwrap();
        assert_eq!(host.servers_tally(), Tally::new(2, 1, 0));
        assert_eq!(host.runtimes().len(), 1);
        assert!(host.alerts().is_clear());
    }
}
