// ============================================================================
// Error Types - Binary Pool Market
// ============================================================================
//
// Every rejection here is an ordinary, expected answer to an invalid call.
// None of them are fatal and the ledger never retries on its own behalf.
//
// ============================================================================

use thiserror::Error;

// ============================================================================
// ASSET ERRORS
// ============================================================================

/// Rejection reported by the asset-transfer collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("insufficient balance for {account}: has {available}, needs {requested}")]
    InsufficientBalance {
        account: String,
        available: u64,
        requested: u64,
    },

    #[error("insufficient allowance for {account}: approved {approved}, needs {requested}")]
    InsufficientAllowance {
        account: String,
        approved: u64,
        requested: u64,
    },

    #[error("custody holds {available}, cannot pay out {requested}")]
    InsufficientCustody { available: u64, requested: u64 },

    /// Crediting the account would push its balance past `u64::MAX`.
    #[error("crediting {amount} to {account} would overflow its balance of {balance}")]
    BalanceOverflow {
        account: String,
        balance: u64,
        amount: u64,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// MARKET ERRORS
// ============================================================================

/// Errors returned by the market ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Operation requires the market to be open.
    #[error("market is settled and no longer accepts bets or withdrawals")]
    MarketClosed,

    #[error("market has already been settled")]
    AlreadySettled,

    #[error("market has not been settled yet")]
    NotSettled,

    #[error("stake amount must be greater than zero")]
    InvalidAmount,

    /// The bet would push the combined pool past `u64::MAX`.
    #[error("stake of {amount} would overflow the combined pool")]
    AmountOverflow { amount: u64 },

    #[error("no live stake on this outcome")]
    NoStake,

    #[error("no stake on the winning outcome")]
    NoWinningStake,

    #[error("reward already claimed")]
    AlreadyClaimed,

    #[error("caller {caller} is not allowed to settle this market")]
    Unauthorized { caller: String },

    #[error("asset transfer failed: {0}")]
    TransferFailed(#[from] AssetError),
}

impl MarketError {
    /// Stable, machine-readable name of the variant.
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::MarketClosed => "MarketClosed",
            MarketError::AlreadySettled => "AlreadySettled",
            MarketError::NotSettled => "NotSettled",
            MarketError::InvalidAmount => "InvalidAmount",
            MarketError::AmountOverflow { .. } => "AmountOverflow",
            MarketError::NoStake => "NoStake",
            MarketError::NoWinningStake => "NoWinningStake",
            MarketError::AlreadyClaimed => "AlreadyClaimed",
            MarketError::Unauthorized { .. } => "Unauthorized",
            MarketError::TransferFailed(_) => "TransferFailed",
        }
    }
}

// ============================================================================
// CONFIG ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid fee rate {numerator}/{denominator}: need denominator > 0 and numerator <= denominator")]
    InvalidFeeRate { numerator: u64, denominator: u64 },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("no settlement resolvers configured; set MARKET_RESOLVERS or MARKET_OPEN_SETTLEMENT=true")]
    NoResolvers,
}

// ============================================================================
// PERSISTENCE ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
