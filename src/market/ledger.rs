//! Market Ledger for a two-outcome pooled market
//!
//! Holds every stake, both pool totals, the settlement record, the claim
//! record and the one-shot fee flag for a single market.
//!
//! ORDERING RULE:
//! - Bookkeeping is updated before every outbound transfer
//! - A rejected transfer rolls the bookkeeping back, so each operation
//!   either fully happens or leaves the ledger untouched
//!
//! PAYOUT:
//! - reward = floor(stake * (pool - fee) / winning_total)
//! - fee    = floor(pool * numerator / denominator), paid once on first claim
//! - Rounding residue stays in custody

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{FeeRate, MarketStatus, Odds, Outcome};
use crate::asset::AssetLedger;
use crate::authority::SettlementAuthority;
use crate::error::MarketError;
use crate::events::{EventRecord, EventSink, MarketEvent, TracingSink};

// ============================================================================
// DATA MODEL
// ============================================================================

/// Write-once record of the declared result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub winning_outcome: Outcome,
    pub settled_at: DateTime<Utc>,
}

/// Everything the ledger knows about one market, in serializable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBook {
    /// Live stakes, one map per outcome (indexed by `Outcome::index`)
    stakes: [HashMap<String, u64>; 2],
    /// Running pool totals, one per outcome
    totals: [u64; 2],
    settlement: Option<Settlement>,
    claimed: HashSet<String>,
    fee_transferred: bool,
    fee_rate: FeeRate,
    fee_recipient: Option<String>,
}

impl MarketBook {
    pub fn new(fee_rate: FeeRate, fee_recipient: Option<String>) -> Self {
        Self {
            stakes: [HashMap::new(), HashMap::new()],
            totals: [0, 0],
            settlement: None,
            claimed: HashSet::new(),
            fee_transferred: false,
            fee_rate,
            fee_recipient,
        }
    }

    fn stake(&self, participant: &str, outcome: Outcome) -> u64 {
        self.stakes[outcome.index()]
            .get(participant)
            .copied()
            .unwrap_or(0)
    }

    fn total_pool(&self) -> u64 {
        // place_bet keeps the sum within u64
        self.totals[0] + self.totals[1]
    }
}

/// How a claim is computed. All amounts in asset units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardQuote {
    pub winning_outcome: Outcome,
    pub stake: u64,
    pub winning_total: u64,
    pub total_pool: u64,
    pub fee: u64,
    pub pool_after_fee: u64,
    pub reward: u64,
}

/// Read-only summary of the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub status: MarketStatus,
    pub winning_outcome: Option<Outcome>,
    pub settled_at: Option<DateTime<Utc>>,
    pub total_a: u64,
    pub total_b: u64,
    pub total_pool: u64,
    pub odds: Odds,
    pub fee_rate: FeeRate,
    pub fee_amount: u64,
    pub fee_recipient: Option<String>,
    pub fee_transferred: bool,
    pub bettors_a: usize,
    pub bettors_b: usize,
    pub claims: usize,
}

// ============================================================================
// LEDGER
// ============================================================================

pub struct MarketLedger<A: AssetLedger> {
    book: MarketBook,
    asset: A,
    sink: Arc<dyn EventSink>,
}

impl<A: AssetLedger> MarketLedger<A> {
    /// Fresh, open market. Events go to `tracing` until `with_sink` is used.
    pub fn new(asset: A, fee_rate: FeeRate, fee_recipient: Option<String>) -> Self {
        Self::restore(MarketBook::new(fee_rate, fee_recipient), asset)
    }

    /// Rebuild a ledger around previously persisted state.
    pub fn restore(book: MarketBook, asset: A) -> Self {
        Self {
            book,
            asset,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn book(&self) -> &MarketBook {
        &self.book
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    /// Direct access to the collaborator, for funding and approvals.
    pub fn asset_mut(&mut self) -> &mut A {
        &mut self.asset
    }

    fn emit(&self, event: MarketEvent) {
        self.sink.emit(&EventRecord::new(event));
    }

    // ========================================================================
    // BETTING (OPEN STATE)
    // ========================================================================

    pub fn place_bet(
        &mut self,
        participant: &str,
        outcome: Outcome,
        amount: u64,
    ) -> Result<(), MarketError> {
        if !self.status().is_open() {
            return Err(MarketError::MarketClosed);
        }
        if amount == 0 {
            return Err(MarketError::InvalidAmount);
        }
        if self.book.total_pool().checked_add(amount).is_none() {
            return Err(MarketError::AmountOverflow { amount });
        }

        if let Err(e) = self.asset.transfer_in(participant, amount) {
            warn!(%participant, %outcome, amount, error = %e, "stake transfer rejected");
            return Err(e.into());
        }

        // Overflow is ruled out by the combined-pool check above
        *self.book.stakes[outcome.index()]
            .entry(participant.to_string())
            .or_insert(0) += amount;
        self.book.totals[outcome.index()] += amount;

        self.emit(MarketEvent::BetPlaced {
            participant: participant.to_string(),
            outcome,
            amount,
        });
        Ok(())
    }

    /// Return a participant's whole stake on `outcome`. Returns the amount.
    pub fn withdraw_bet(&mut self, participant: &str, outcome: Outcome) -> Result<u64, MarketError> {
        if !self.status().is_open() {
            return Err(MarketError::MarketClosed);
        }
        let stake = self.book.stake(participant, outcome);
        if stake == 0 {
            return Err(MarketError::NoStake);
        }

        let slot = outcome.index();
        self.book.stakes[slot].remove(participant);
        self.book.totals[slot] -= stake;

        if let Err(e) = self.asset.transfer_out(participant, stake) {
            self.book.stakes[slot].insert(participant.to_string(), stake);
            self.book.totals[slot] += stake;
            warn!(%participant, %outcome, stake, error = %e, "withdrawal transfer rejected, stake restored");
            return Err(e.into());
        }

        self.emit(MarketEvent::BetWithdrawn {
            participant: participant.to_string(),
            outcome,
            amount: stake,
        });
        Ok(stake)
    }

    // ========================================================================
    // SETTLEMENT
    // ========================================================================

    pub fn settle_market(&mut self, winning_outcome: Outcome) -> Result<(), MarketError> {
        if self.book.settlement.is_some() {
            return Err(MarketError::AlreadySettled);
        }

        self.book.settlement = Some(Settlement {
            winning_outcome,
            settled_at: Utc::now(),
        });
        info!(
            %winning_outcome,
            total_a = self.book.totals[0],
            total_b = self.book.totals[1],
            "settlement recorded"
        );

        self.emit(MarketEvent::MarketSettled { winning_outcome });
        Ok(())
    }

    /// `settle_market` gated by an authorization policy.
    pub fn settle_market_as(
        &mut self,
        caller: &str,
        winning_outcome: Outcome,
        authority: &dyn SettlementAuthority,
    ) -> Result<(), MarketError> {
        if !authority.may_settle(caller) {
            warn!(%caller, "settlement refused by authority");
            return Err(MarketError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        self.settle_market(winning_outcome)
    }

    // ========================================================================
    // CLAIMS (SETTLED STATE)
    // ========================================================================

    /// What `claim_reward` would pay right now, with the same preconditions.
    pub fn quote_reward(&self, participant: &str) -> Result<RewardQuote, MarketError> {
        let settlement = self.book.settlement.ok_or(MarketError::NotSettled)?;
        if self.book.claimed.contains(participant) {
            return Err(MarketError::AlreadyClaimed);
        }

        let winner = settlement.winning_outcome;
        let stake = self.book.stake(participant, winner);
        let winning_total = self.book.totals[winner.index()];
        if stake == 0 || winning_total == 0 {
            return Err(MarketError::NoWinningStake);
        }

        let total_pool = self.book.total_pool();
        let fee = self.book.fee_rate.fee_on(total_pool);
        let pool_after_fee = total_pool - fee;
        let reward = (stake as u128 * pool_after_fee as u128 / winning_total as u128) as u64;

        Ok(RewardQuote {
            winning_outcome: winner,
            stake,
            winning_total,
            total_pool,
            fee,
            pool_after_fee,
            reward,
        })
    }

    pub fn claim_reward(&mut self, participant: &str) -> Result<u64, MarketError> {
        let quote = self.quote_reward(participant)?;
        debug!(%participant, ?quote, "claim computed");

        // Totals stay as they are: later claims divide by the same pools
        let slot = quote.winning_outcome.index();
        self.book.claimed.insert(participant.to_string());
        self.book.stakes[slot].remove(participant);
        if let Err(e) = self.asset.transfer_out(participant, quote.reward) {
            self.book.claimed.remove(participant);
            self.book.stakes[slot].insert(participant.to_string(), quote.stake);
            warn!(%participant, reward = quote.reward, error = %e, "reward transfer rejected, claim reverted");
            return Err(e.into());
        }

        self.emit(MarketEvent::RewardClaimed {
            participant: participant.to_string(),
            amount: quote.reward,
        });

        self.pay_fee_once(quote.fee);
        Ok(quote.reward)
    }

    /// First successful claim carries the fee payout. Never retried.
    fn pay_fee_once(&mut self, fee: u64) {
        if self.book.fee_transferred || fee == 0 {
            return;
        }
        let Some(recipient) = self.book.fee_recipient.clone() else {
            return;
        };

        self.book.fee_transferred = true;
        match self.asset.transfer_out(&recipient, fee) {
            Ok(()) => self.emit(MarketEvent::FeeCollected {
                recipient,
                amount: fee,
            }),
            Err(e) => {
                warn!(%recipient, fee, error = %e, "fee payout rejected and will not be retried");
                self.emit(MarketEvent::FeeTransferFailed {
                    recipient,
                    amount: fee,
                    reason: e.to_string(),
                });
            }
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn get_odds(&self) -> Odds {
        Odds::from_totals(self.book.totals[0], self.book.totals[1])
    }

    pub fn status(&self) -> MarketStatus {
        if self.book.settlement.is_some() {
            MarketStatus::Settled
        } else {
            MarketStatus::Open
        }
    }

    pub fn winning_outcome(&self) -> Option<Outcome> {
        self.book.settlement.map(|s| s.winning_outcome)
    }

    pub fn stake_of(&self, participant: &str, outcome: Outcome) -> u64 {
        self.book.stake(participant, outcome)
    }

    pub fn total_on(&self, outcome: Outcome) -> u64 {
        self.book.totals[outcome.index()]
    }

    pub fn total_pool(&self) -> u64 {
        self.book.total_pool()
    }

    pub fn has_claimed(&self, participant: &str) -> bool {
        self.book.claimed.contains(participant)
    }

    pub fn fee_transferred(&self) -> bool {
        self.book.fee_transferred
    }

    pub fn fee_rate(&self) -> FeeRate {
        self.book.fee_rate
    }

    pub fn fee_recipient(&self) -> Option<&str> {
        self.book.fee_recipient.as_deref()
    }

    /// Fee charged on the current combined pool.
    pub fn fee_amount(&self) -> u64 {
        self.book.fee_rate.fee_on(self.book.total_pool())
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            status: self.status(),
            winning_outcome: self.winning_outcome(),
            settled_at: self.book.settlement.map(|s| s.settled_at),
            total_a: self.book.totals[0],
            total_b: self.book.totals[1],
            total_pool: self.book.total_pool(),
            odds: self.get_odds(),
            fee_rate: self.book.fee_rate,
            fee_amount: self.fee_amount(),
            fee_recipient: self.book.fee_recipient.clone(),
            fee_transferred: self.book.fee_transferred,
            bettors_a: self.book.stakes[0].len(),
            bettors_b: self.book.stakes[1].len(),
            claims: self.book.claimed.len(),
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
