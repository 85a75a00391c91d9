// ── Diff primitives ──
//
// Pure helpers that apply a partial-update event to live state and
// report what changed. They are deliberately split from the fan-out in
// `Notifier` so resources never hold a state lock across notification.

use std::sync::Arc;

use crate::events::ListDelta;
use crate::model::{AppState, RuntimeRef, Server, Tally};

// ── Keyed ───────────────────────────────────────────────────────────

/// Identity used when matching removals and replacements inside a
/// tracked list.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl Keyed for AppState {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for RuntimeRef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Arc<Server> {
    fn key(&self) -> &str {
        self.id().as_str()
    }
}

// ── ListChange ──────────────────────────────────────────────────────

/// Notification payload for a tracked-list change.
#[derive(Debug, Clone, PartialEq)]
pub struct ListChange<T> {
    pub new_list: Vec<T>,
    pub old_list: Vec<T>,
    pub added: Vec<T>,
    pub removed: Vec<String>,
    pub changed: Vec<T>,
}

// ── Primitives ──────────────────────────────────────────────────────

/// Apply a partial attribute update.
///
/// `None` means the event did not carry the attribute: no mutation, no
/// notification. Presence of the key is the trigger, so a present-but-
/// equal value still reports a change, as the wire contract requires.
pub fn diff_attribute<T: Clone>(slot: &mut T, incoming: Option<T>) -> Option<(T, T)> {
    let incoming = incoming?;
    let old = std::mem::replace(slot, incoming.clone());
    Some((incoming, old))
}

/// Apply a partial tally update, batching all carried fields into one
/// `(new, old)` pair. Returns `None` when every field is absent.
pub fn diff_tally(
    slot: &mut Tally,
    up: Option<u32>,
    down: Option<u32>,
    unknown: Option<u32>,
) -> Option<(Tally, Tally)> {
    if up.is_none() && down.is_none() && unknown.is_none() {
        return None;
    }
    let old = *slot;
    if let Some(up) = up {
        slot.up = up;
    }
    if let Some(down) = down {
        slot.down = down;
    }
    if let Some(unknown) = unknown {
        slot.unknown = unknown;
    }
    Some((*slot, old))
}

/// Apply a list delta: removals first (matched by key), then changed-
/// entry replacements, then appends. Returns `None` when all three
/// delta sets are empty, so an empty delta can never fan out a
/// spurious re-render.
pub fn apply_delta<T: Keyed + Clone>(
    list: &mut Vec<T>,
    delta: &ListDelta<T>,
) -> Option<ListChange<T>> {
    if delta.is_empty() {
        return None;
    }

    let old_list = list.clone();
    for key in &delta.removed {
        if let Some(pos) = list.iter().position(|entry| entry.key() == key) {
            list.remove(pos);
        }
    }
    for replacement in &delta.changed {
        if let Some(slot) = list
            .iter_mut()
            .find(|entry| entry.key() == replacement.key())
        {
            *slot = replacement.clone();
        }
    }
    list.extend(delta.added.iter().cloned());

    Some(ListChange {
        new_list: list.clone(),
        old_list,
        added: delta.added.clone(),
        removed: delta.removed.clone(),
        changed: delta.changed.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn absent_attribute_is_a_no_op() {
        let mut slot = Status::Started;
        assert!(diff_attribute(&mut slot, None).is_none());
        assert_eq!(slot, Status::Started);
    }

    #[test]
    fn present_attribute_reports_new_and_old() {
        let mut slot = Status::Started;
        let (new, old) = diff_attribute(&mut slot, Some(Status::Stopped)).unwrap();
        assert_eq!(new, Status::Stopped);
        assert_eq!(old, Status::Started);
        assert_eq!(slot, Status::Stopped);
    }

    #[test]
    fn present_but_equal_attribute_still_reports() {
        // Presence of the key is the trigger, not value inequality.
        let mut slot = Status::Started;
        assert!(diff_attribute(&mut slot, Some(Status::Started)).is_some());
    }

    #[test]
    fn empty_tally_update_is_a_no_op() {
        let mut tally = Tally::new(2, 1, 0);
        assert!(diff_tally(&mut tally, None, None, None).is_none());
        assert_eq!(tally, Tally::new(2, 1, 0));
    }

    #[test]
    fn tally_update_is_batched_and_partial() {
        let mut tally = Tally::new(2, 1, 0);
        let (new, old) = diff_tally(&mut tally, Some(1), Some(2), None).unwrap();
        assert_eq!(old, Tally::new(2, 1, 0));
        // `unknown` was absent and must keep its current value.
        assert_eq!(new, Tally::new(1, 2, 0));
        assert_eq!(tally, new);
    }

    #[test]
    fn empty_delta_never_notifies() {
        let mut list = ids(&["s1", "s2"]);
        assert!(apply_delta(&mut list, &ListDelta::default()).is_none());
        assert_eq!(list, ids(&["s1", "s2"]));
    }

    #[test]
    fn removals_apply_before_additions() {
        let mut list = ids(&["s1", "s2", "s3"]);
        let delta = ListDelta {
            added: ids(&["s4"]),
            removed: ids(&["s2"]),
            changed: Vec::new(),
        };
        let change = apply_delta(&mut list, &delta).unwrap();
        assert_eq!(change.old_list, ids(&["s1", "s2", "s3"]));
        assert_eq!(change.new_list, ids(&["s1", "s3", "s4"]));
        assert_eq!(change.added, ids(&["s4"]));
        assert_eq!(change.removed, ids(&["s2"]));
    }

    #[test]
    fn removal_of_unknown_key_is_tolerated() {
        let mut list = ids(&["s1"]);
        let delta = ListDelta {
            added: Vec::new(),
            removed: ids(&["nope"]),
            changed: Vec::new(),
        };
        // Still a reportable change (the delta was non-empty), but the
        // list is untouched.
        let change = apply_delta(&mut list, &delta).unwrap();
        assert_eq!(change.new_list, ids(&["s1"]));
    }

    #[test]
    fn changed_entries_replace_by_key() {
        let mut list = vec![
            AppState::new("app1", Status::Started),
            AppState::new("app2", Status::Started),
        ];
        let delta = ListDelta {
            added: Vec::new(),
            removed: Vec::new(),
            changed: vec![AppState::new("app2", Status::Stopped)],
        };
        let change = apply_delta(&mut list, &delta).unwrap();
        assert_eq!(change.new_list[1].state, Status::Stopped);
        assert_eq!(change.new_list[0].state, Status::Started);
    }
}
