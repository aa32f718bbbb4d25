// Request and response bodies for the market HTTP API

use serde::{Deserialize, Serialize};

use crate::events::EventRecord;
use crate::market::{MarketSnapshot, Odds, Outcome, RewardQuote};

// ===== REQUESTS =====

#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    pub account: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveRequest {
    pub account: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBetRequest {
    pub participant: String,
    pub outcome: Outcome,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub participant: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettleRequest {
    /// Identity checked against the settlement authority
    pub caller: String,
    pub winning_outcome: Outcome,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    pub participant: String,
}

// ===== RESPONSES =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: u64,
    pub allowance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetResponse {
    pub success: bool,
    pub participant: String,
    pub outcome: Outcome,
    pub amount: u64,
    pub stake: u64,
    pub odds: Odds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub success: bool,
    pub participant: String,
    pub outcome: Outcome,
    pub returned: u64,
    pub odds: Odds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleResponse {
    pub success: bool,
    pub winning_outcome: Outcome,
    pub total_pool: u64,
    pub fee_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub participant: String,
    pub reward: u64,
    pub fee_transferred: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakesResponse {
    pub participant: String,
    pub stake_a: u64,
    pub stake_b: u64,
    pub claimed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub participant: String,
    #[serde(flatten)]
    pub quote: RewardQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResponse {
    #[serde(flatten)]
    pub snapshot: MarketSnapshot,
    pub custody_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}
