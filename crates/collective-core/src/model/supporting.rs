// ── Small supporting value types ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::status::Status;

/// Rolled-up alert state attached to hosts and servers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub count: u32,
}

impl AlertSummary {
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    pub fn is_clear(self) -> bool {
        self.count == 0
    }
}

/// Flavor of runtime installed on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RuntimeType {
    Liberty,
    NodeJs,
}

/// Lightweight reference to a runtime tracked by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeRef {
    pub id: String,
    pub runtime_type: RuntimeType,
}

/// An application deployed on a server, tracked as a name/state pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub name: String,
    pub state: Status,
}

impl AppState {
    pub fn new(name: impl Into<String>, state: Status) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}
