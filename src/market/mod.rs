// ============================================================================
// Market Module - Settlement & Accounting Engine
// ============================================================================
//
// This module contains the two-outcome pooled market:
//   - outcome: Outcome (A/B) and the Open → Settled lifecycle
//   - fee: Protocol fee fraction and its floor arithmetic
//   - odds: Pool share per side in parts-per-thousand
//   - ledger: Stakes, pool totals, settlement, claims and fee payout
//
// ============================================================================

pub mod fee;
pub mod ledger;
pub mod odds;
pub mod outcome;

pub use fee::*;
pub use ledger::*;
pub use odds::*;
pub use outcome::*;
