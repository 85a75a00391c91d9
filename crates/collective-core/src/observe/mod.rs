// ── Observation layer ──
//
// Observer capability traits, the subscriber-owning Notifier, and the
// pure diff primitives resources use to turn partial-update events into
// notifications.

mod diff;
mod notifier;

pub use diff::{Keyed, ListChange, apply_delta, diff_attribute, diff_tally};
pub use notifier::Notifier;

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{AlertSummary, AppState, Origin, RuntimeRef, Server, Status, Tally};

// ── Observer contract ───────────────────────────────────────────────

/// Base contract for anything that subscribes to a resource.
///
/// Dispatch is by explicit capability: the notifier asks for the
/// interface matching the notification kind and silently skips observers
/// that do not expose it. Implementors opt in per kind by overriding the
/// matching `as_*` accessor to return `Some(self)`.
pub trait Observer: Send + Sync + 'static {
    /// Stable identifier used in diagnostics when a handler fails.
    fn observer_id(&self) -> &str;

    fn as_state(&self) -> Option<&dyn StateObserver> {
        None
    }

    fn as_tally(&self) -> Option<&dyn TallyObserver> {
        None
    }

    fn as_list(&self) -> Option<&dyn ListObserver> {
        None
    }

    fn as_members(&self) -> Option<&dyn MemberObserver> {
        None
    }

    fn as_alerts(&self) -> Option<&dyn AlertObserver> {
        None
    }

    fn as_destroy(&self) -> Option<&dyn DestroyObserver> {
        None
    }

    fn as_resolve_errors(&self) -> Option<&dyn ErrorObserver> {
        None
    }
}

// ── Capability interfaces ───────────────────────────────────────────
//
// Handlers return `Result`; an `Err` is logged by the notifier and
// never interrupts delivery to the remaining subscribers.

/// Scalar attribute changes.
pub trait StateObserver: Send + Sync {
    fn on_state_change(&self, origin: &Origin, new: Status, old: Status) -> Result<(), CoreError>;

    fn on_cluster_change(
        &self,
        origin: &Origin,
        new: Option<&str>,
        old: Option<&str>,
    ) -> Result<(), CoreError> {
        let _ = (origin, new, old);
        Ok(())
    }
}

/// Batched tally changes. One notification covers all tally fields
/// carried by the triggering event.
pub trait TallyObserver: Send + Sync {
    fn on_tally_change(&self, origin: &Origin, new: &Tally, old: &Tally) -> Result<(), CoreError>;
}

/// Tracked-list changes on concrete resources. Default bodies make each
/// method opt-in on its own.
pub trait ListObserver: Send + Sync {
    fn on_servers_change(
        &self,
        origin: &Origin,
        change: &ListChange<String>,
    ) -> Result<(), CoreError> {
        let _ = (origin, change);
        Ok(())
    }

    fn on_apps_change(
        &self,
        origin: &Origin,
        change: &ListChange<AppState>,
    ) -> Result<(), CoreError> {
        let _ = (origin, change);
        Ok(())
    }

    fn on_runtimes_change(
        &self,
        origin: &Origin,
        change: &ListChange<RuntimeRef>,
    ) -> Result<(), CoreError> {
        let _ = (origin, change);
        Ok(())
    }
}

/// Resolved-member changes published by derived collections.
pub trait MemberObserver: Send + Sync {
    fn on_members_change(
        &self,
        origin: &Origin,
        change: &ListChange<Arc<Server>>,
    ) -> Result<(), CoreError>;
}

/// Alert roll-up changes.
pub trait AlertObserver: Send + Sync {
    fn on_alerts_change(
        &self,
        origin: &Origin,
        new: AlertSummary,
        old: AlertSummary,
    ) -> Result<(), CoreError>;
}

/// Cascading teardown notification.
pub trait DestroyObserver: Send + Sync {
    fn on_destroyed(&self, origin: &Origin) -> Result<(), CoreError>;
}

/// Recoverable resolution failures (an added child could not be
/// resolved to a full object).
pub trait ErrorObserver: Send + Sync {
    fn on_resolve_error(&self, origin: &Origin, error: &CoreError) -> Result<(), CoreError>;
}
