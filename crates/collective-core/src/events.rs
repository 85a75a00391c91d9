// ── Server-pushed change events ──
//
// The wire contract of the propagation core: an event carries any subset
// of a resource's tracked fields. Presence of a key means "this field
// changed"; absence means "no change, leave the current value". A missing
// key is NEVER treated as "set to null/zero".

use serde::{Deserialize, Deserializer};

use crate::model::{AlertSummary, AppState, RuntimeRef, Status};

// ── Delta sets ──────────────────────────────────────────────────────

/// Added/removed/changed sets for a plain tracked list.
///
/// Removals and changed-entry matching are by key (the id for id lists,
/// the `id`/`name` field for object lists).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListDelta<T> {
    pub added: Vec<T>,
    pub removed: Vec<String>,
    pub changed: Vec<T>,
}

impl<T> ListDelta<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl<T> Default for ListDelta<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

/// Delta for a tallied list: optional tally fields plus list deltas,
/// carried under one event key as the server reports them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TalliedDelta<T> {
    pub up: Option<u32>,
    pub down: Option<u32>,
    pub unknown: Option<u32>,
    pub added: Vec<T>,
    pub removed: Vec<String>,
    pub changed: Vec<T>,
}

impl<T: Clone> TalliedDelta<T> {
    /// The list portion of the delta, without the tally fields.
    pub fn to_list_delta(&self) -> ListDelta<T> {
        ListDelta {
            added: self.added.clone(),
            removed: self.removed.clone(),
            changed: self.changed.clone(),
        }
    }
}

impl<T> Default for TalliedDelta<T> {
    fn default() -> Self {
        Self {
            up: None,
            down: None,
            unknown: None,
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

// ── Per-resource events ─────────────────────────────────────────────

/// Partial update for a host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostEvent {
    pub state: Option<Status>,
    pub servers: Option<TalliedDelta<String>>,
    pub runtimes: Option<ListDelta<RuntimeRef>>,
    pub alerts: Option<AlertSummary>,
}

/// Partial update for a server.
///
/// `cluster` is a nullable attribute: `None` means the key was absent
/// (unchanged), `Some(None)` means an explicit null (cluster cleared).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerEvent {
    pub state: Option<Status>,
    #[serde(deserialize_with = "double_option")]
    pub cluster: Option<Option<String>>,
    pub apps: Option<TalliedDelta<AppState>>,
    pub alerts: Option<AlertSummary>,
}

/// Partial update for a cluster.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterEvent {
    pub state: Option<Status>,
    pub servers: Option<TalliedDelta<String>>,
    pub alerts: Option<AlertSummary>,
}

/// Partial update for a runtime.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeEvent {
    pub state: Option<Status>,
    pub servers: Option<TalliedDelta<String>>,
}

/// Keeps "key present with null value" distinguishable from "key absent":
/// this runs only when the key is present, so the outer `Option` is
/// always `Some`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_stay_absent() {
        let event: HostEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event, HostEvent::default());
    }

    #[test]
    fn cluster_absent_vs_null() {
        let absent: ServerEvent = serde_json::from_str(r#"{"state":"STOPPED"}"#).unwrap();
        assert_eq!(absent.cluster, None);

        let null: ServerEvent = serde_json::from_str(r#"{"cluster":null}"#).unwrap();
        assert_eq!(null.cluster, Some(None));

        let set: ServerEvent = serde_json::from_str(r#"{"cluster":"cluster1"}"#).unwrap();
        assert_eq!(set.cluster, Some(Some("cluster1".to_owned())));
    }

    #[test]
    fn tallied_delta_carries_tally_and_list_parts() {
        let event: HostEvent = serde_json::from_str(
            r#"{"servers":{"up":1,"down":2,"unknown":0,"removed":["s2"],"added":["s4"]}}"#,
        )
        .unwrap();
        let servers = event.servers.unwrap();
        assert_eq!(servers.up, Some(1));
        assert_eq!(servers.removed, vec!["s2".to_owned()]);
        assert_eq!(servers.added, vec!["s4".to_owned()]);
        assert!(servers.changed.is_empty());
    }

    #[test]
    fn partial_tally_leaves_other_fields_absent() {
        let event: RuntimeEvent = serde_json::from_str(r#"{"servers":{"up":3}}"#).unwrap();
        let servers = event.servers.unwrap();
        assert_eq!(servers.up, Some(3));
        assert_eq!(servers.down, None);
        assert_eq!(servers.unknown, None);
        assert!(servers.to_list_delta().is_empty());
    }
}
