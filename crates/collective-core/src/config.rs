// ── Runtime tuning configuration ──
//
// These types describe *how* the propagation layer behaves at runtime.
// They carry tuning knobs only and never touch disk; the embedding
// application constructs them and hands them in.

use std::time::Duration;

/// Tuning for id-to-object resolution performed by derived collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Upper bound on a single resolution round-trip. A resolution that
    /// exceeds it is reported to subscribers as a resolve error.
    pub timeout: Duration,
}

impl ResolveConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}
