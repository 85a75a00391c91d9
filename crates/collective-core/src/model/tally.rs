// ── Tallies and tracked child lists ──

use serde::{Deserialize, Serialize};

// ── Tally ───────────────────────────────────────────────────────────

/// Named-integer summary of child resource states.
///
/// Invariant: after any update the fields sum to the number of tracked
/// children for the owning resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub up: u32,
    pub down: u32,
    pub unknown: u32,
}

impl Tally {
    pub fn new(up: u32, down: u32, unknown: u32) -> Self {
        Self { up, down, unknown }
    }

    pub fn total(self) -> u32 {
        self.up + self.down + self.unknown
    }

    /// Whether the tally sums to the given child count.
    pub fn accounts_for(self, children: usize) -> bool {
        usize::try_from(self.total()).is_ok_and(|t| t == children)
    }
}

// ── Tracked ─────────────────────────────────────────────────────────

/// A tally together with the child list it summarizes.
///
/// Wire format is flat: `{"up": 2, "down": 1, "unknown": 0, "list": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

impl<T> Tracked<T> {
    pub fn new(tally: Tally, list: Vec<T>) -> Self {
        Self { tally, list }
    }

    /// Whether the tally accounts for every tracked child.
    pub fn is_consistent(&self) -> bool {
        self.tally.accounts_for(self.list.len())
    }
}

impl<T> Default for Tracked<T> {
    fn default() -> Self {
        Self {
            tally: Tally::default(),
            list: Vec::new(),
        }
    }
}
