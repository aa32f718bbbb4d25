// Application state management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::asset::InMemoryAsset;
use crate::authority::SettlementAuthority;
use crate::config::MarketConfig;
use crate::error::StateError;
use crate::events::RecordingSink;
use crate::market::{MarketBook, MarketLedger};

/// One market behind one lock: writers are serialized, readers share.
pub type SharedState = Arc<RwLock<AppState>>;

pub struct AppState {
    pub market: MarketLedger<InMemoryAsset>,
    pub authority: Box<dyn SettlementAuthority>,
    pub events: Arc<RecordingSink>,
    pub state_path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    book: MarketBook,
    asset: InMemoryAsset,
}

impl AppState {
    /// Fresh market from configuration.
    pub fn new(config: &MarketConfig) -> Self {
        let events = Arc::new(RecordingSink::new());
        let market = MarketLedger::new(
            InMemoryAsset::new(config.custody_account.clone()),
            config.fee_rate,
            config.fee_recipient.clone(),
        )
        .with_sink(events.clone());

        Self {
            market,
            authority: config.settlement.authority(),
            events,
            state_path: config.state_path.clone(),
        }
    }

    /// Reload the persisted market if the state file exists, else start fresh.
    ///
    /// A reloaded market keeps the fee terms and custody it was created with.
    pub fn load_or_new(config: &MarketConfig) -> Self {
        let mut state = Self::new(config);
        match state.load_from_disk() {
            Ok(true) => {
                tracing::info!(path = %state.state_path.display(), "loaded persisted market state");
                state.warn_on_config_drift(config);
            }
            Ok(false) => tracing::info!("no persisted state found, starting a fresh market"),
            Err(e) => tracing::warn!(error = %e, "failed to load persisted state, starting a fresh market"),
        }
        state
    }

    /// Log every persisted market term that no longer matches `config`.
    /// Returns the names of the differing settings.
    fn warn_on_config_drift(&self, config: &MarketConfig) -> Vec<&'static str> {
        let mut drifted = Vec::new();

        let persisted_rate = self.market.fee_rate();
        if persisted_rate != config.fee_rate {
            tracing::warn!(
                persisted = %persisted_rate,
                configured = %config.fee_rate,
                "fee rate differs from configuration, keeping the persisted rate"
            );
            drifted.push("fee_rate");
        }

        let persisted_recipient = self.market.fee_recipient();
        if persisted_recipient != config.fee_recipient.as_deref() {
            tracing::warn!(
                persisted = persisted_recipient.unwrap_or("<none>"),
                configured = config.fee_recipient.as_deref().unwrap_or("<none>"),
                "fee recipient differs from configuration, keeping the persisted recipient"
            );
            drifted.push("fee_recipient");
        }

        let persisted_custody = self.market.asset().custody_account();
        if persisted_custody != config.custody_account {
            tracing::warn!(
                persisted = persisted_custody,
                configured = %config.custody_account,
                "custody account differs from configuration, keeping the persisted account"
            );
            drifted.push("custody_account");
        }

        drifted
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    pub fn save_to_disk(&self) -> Result<(), StateError> {
        let persisted = PersistedState {
            book: self.market.book().clone(),
            asset: self.market.asset().clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;

        if let Some(dir) = self.state_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.state_path, json)?;
        tracing::info!(path = %self.state_path.display(), "market state saved");
        Ok(())
    }

    /// Returns `Ok(false)` when there is nothing to load.
    fn load_from_disk(&mut self) -> Result<bool, StateError> {
        if !Path::new(&self.state_path).exists() {
            return Ok(false);
        }
        let json = fs::read_to_string(&self.state_path)?;
        let persisted: PersistedState = serde_json::from_str(&json)?;

        self.market = MarketLedger::restore(persisted.book, persisted.asset)
            .with_sink(self.events.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetLedger;
    use crate::config::SettlementPolicy;
    use crate::market::{FeeRate, MarketStatus, Outcome};
    use std::net::SocketAddr;

    fn config_at(path: PathBuf) -> MarketConfig {
        MarketConfig {
            fee_rate: FeeRate::default(),
            fee_recipient: Some("TREASURY".into()),
            custody_account: "CUSTODY".into(),
            settlement: SettlementPolicy::Resolvers(vec!["ORACLE".into()]),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            state_path: path,
        }
    }

    fn temp_state_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("binary-pool-market-{}-{}", name, uuid::Uuid::new_v4()))
            .join("state.json")
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let path = temp_state_path("roundtrip");
        let config = config_at(path.clone());

        let mut state = AppState::new(&config);
        state.market.asset_mut().mint("ALICE", 500).unwrap();
        state.market.asset_mut().approve("ALICE", 500);
        state.market.place_bet("ALICE", Outcome::A, 120).unwrap();
        state
            .market
            .settle_market_as("ORACLE", Outcome::A, state.authority.as_ref())
            .unwrap();
        state.save_to_disk().unwrap();

        let reloaded = AppState::load_or_new(&config);
        assert_eq!(reloaded.market.status(), MarketStatus::Settled);
        assert_eq!(reloaded.market.stake_of("ALICE", Outcome::A), 120);
        assert_eq!(reloaded.market.asset().balance_of("ALICE"), 380);
        assert_eq!(reloaded.market.asset().custody_balance(), 120);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_or_corrupt_file_starts_fresh() {
        let path = temp_state_path("corrupt");
        let config = config_at(path.clone());
        assert_eq!(AppState::load_or_new(&config).market.total_pool(), 0);

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        let mut state = AppState::load_or_new(&config);
        assert_eq!(state.market.status(), MarketStatus::Open);
        assert!(state.market.asset_mut().transfer_out("ALICE", 1).is_err());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_tampered_fee_rate_is_rejected_on_load() {
        let path = temp_state_path("tampered");
        let config = config_at(path.clone());

        let mut state = AppState::new(&config);
        state.market.asset_mut().mint("ALICE", 500).unwrap();
        state.market.asset_mut().approve("ALICE", 500);
        state.market.place_bet("ALICE", Outcome::A, 100).unwrap();
        state.market.settle_market(Outcome::A).unwrap();
        state.save_to_disk().unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["book"]["fee_rate"]["denominator"] = serde_json::json!(0);
        fs::write(&path, json.to_string()).unwrap();

        let mut fresh = AppState::new(&config);
        assert!(matches!(fresh.load_from_disk(), Err(StateError::Json(_))));

        // Falls back to a fresh market instead of one that panics on quote
        let reloaded = AppState::load_or_new(&config);
        assert_eq!(reloaded.market.status(), MarketStatus::Open);
        assert_eq!(reloaded.market.quote_reward("ALICE"), Err(crate::error::MarketError::NotSettled));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_config_drift_is_reported_after_reload() {
        let path = temp_state_path("drift");
        let config = config_at(path.clone());
        AppState::new(&config).save_to_disk().unwrap();

        let unchanged = AppState::load_or_new(&config);
        assert!(unchanged.warn_on_config_drift(&config).is_empty());

        let changed = MarketConfig {
            fee_rate: FeeRate::new(1, 100).unwrap(),
            fee_recipient: Some("NEW_TREASURY".into()),
            ..config.clone()
        };
        let reloaded = AppState::load_or_new(&changed);
        assert_eq!(
            reloaded.warn_on_config_drift(&changed),
            vec!["fee_rate", "fee_recipient"]
        );
        // Persisted terms win
        assert_eq!(reloaded.market.fee_rate(), FeeRate::default());
        assert_eq!(reloaded.market.fee_recipient(), Some("TREASURY"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
