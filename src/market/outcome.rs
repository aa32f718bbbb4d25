use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// OUTCOMES
// ============================================================================

/// One of the two mutually exclusive results a market can settle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    A,
    B,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::A, Outcome::B];

    /// Slot of this outcome in per-outcome storage.
    pub fn index(self) -> usize {
        match self {
            Outcome::A => 0,
            Outcome::B => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::A => write!(f, "A"),
            Outcome::B => write!(f, "B"),
        }
    }
}

// ============================================================================
// MARKET LIFECYCLE
// ============================================================================

/// Whole-market lifecycle status
///
/// Flow: Open → Settled (once, irreversible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Accepting bets and withdrawals
    Open,

    /// Winning outcome recorded
    /// - Claims only
    /// - Pool totals no longer move
    Settled,
}

impl MarketStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, MarketStatus::Open)
    }
}
