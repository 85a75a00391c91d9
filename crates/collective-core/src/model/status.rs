// ── Resource operational state ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// Operational state reported by the server for a host, server, or
/// application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Started,
    Starting,
    Stopped,
    Stopping,
    Unknown,
}
