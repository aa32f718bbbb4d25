//! Binary Pool Market
//! Two-outcome pooled betting: ledger, settlement, claims and the HTTP shell around them

pub mod app_state;
pub mod asset;
pub mod authority;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod market;
pub mod models;

// Re-export the settlement & accounting engine
pub use market::{
    FeeRate, MarketBook, MarketLedger, MarketSnapshot, MarketStatus, Odds, Outcome, RewardQuote,
    Settlement, DEFAULT_FEE_DENOMINATOR, DEFAULT_FEE_NUMERATOR, ODDS_SCALE,
};

// Re-export collaborator seams
pub use asset::{AssetLedger, InMemoryAsset, Transfer, TransferDirection};
pub use authority::{ResolverSet, SettlementAuthority, Unrestricted};
pub use events::{EventRecord, EventSink, MarketEvent, RecordingSink, TracingSink};

pub use app_state::{AppState, SharedState};
pub use config::{MarketConfig, SettlementPolicy};
pub use error::{AssetError, ConfigError, MarketError, StateError};
