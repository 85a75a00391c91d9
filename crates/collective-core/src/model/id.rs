// ── Core identity types ──
//
// ResourceId and ResourceKind form the foundation of every resource type.
// Derived collections compute their ids deterministically from the parent
// id, so two views over the same parent are never ambiguous.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, IntoStaticStr};

// ── ResourceId ──────────────────────────────────────────────────────

/// Canonical identifier for any resource, unique within its kind.
///
/// Top-level ids come from the server (e.g. `"hostA"`,
/// `"hostA,/wlp/usr,server1"`). Derived-collection ids are computed via
/// [`ResourceId::derived`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id for a collection derived from `parent`.
    ///
    /// The same `(kind, parent)` pair always produces the same id.
    pub fn derived(kind: ResourceKind, parent: &ResourceId) -> Self {
        Self(format!("{}({})", kind.tag(), parent.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── ResourceKind ────────────────────────────────────────────────────

/// Tag identifying a resource variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ResourceKind {
    Host,
    Server,
    Cluster,
    Runtime,
    ServersOnHost,
    ServersOnCluster,
    ServersOnRuntime,
}

impl ResourceKind {
    /// Stable wire/id tag, e.g. `"serversOnHost"`.
    pub fn tag(self) -> &'static str {
        self.into()
    }
}

// ── Origin ──────────────────────────────────────────────────────────

/// Identifies the publisher of a notification.
///
/// Derived collections re-publish parent changes under their OWN origin,
/// so a subscriber always sees who it heard from, not where the change
/// ultimately came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub id: ResourceId,
    pub kind: ResourceKind,
}

impl Origin {
    pub fn new(id: ResourceId, kind: ResourceKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.id)
    }
}
