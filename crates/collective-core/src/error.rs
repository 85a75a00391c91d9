// ── Core error types ──
//
// User-facing errors from collective-core. Snapshot validation failures
// are fatal-at-construction; handler and resolution failures are
// recoverable and surfaced through the notification plumbing instead of
// aborting a fan-out.

use thiserror::Error;

use crate::model::{ResourceId, ResourceKind};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Construction errors ──────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Parent resource \"{id}\" is already destroyed")]
    ParentDestroyed { id: ResourceId },

    // ── Resolution errors ────────────────────────────────────────────
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Resolution timed out after {timeout_secs}s")]
    ResolveTimeout { timeout_secs: u64 },

    // ── Notification errors ──────────────────────────────────────────
    /// Returned by an observer handler to reject a notification.
    /// Never interrupts delivery to the remaining subscribers.
    #[error("Handler error: {message}")]
    Handler { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a construction-time validation failure.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
