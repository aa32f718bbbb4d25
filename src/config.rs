// Service configuration, read from the environment (and `.env` when present).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::authority::{ResolverSet, SettlementAuthority, Unrestricted};
use crate::error::ConfigError;
use crate::market::{FeeRate, DEFAULT_FEE_DENOMINATOR, DEFAULT_FEE_NUMERATOR};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_CUSTODY_ACCOUNT: &str = "MARKET_CUSTODY";
pub const DEFAULT_STATE_PATH: &str = "data/market_state.json";

// ============================================================================
// CONFIG
// ============================================================================

/// Who may settle the market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementPolicy {
    /// Anyone. Must be switched on explicitly.
    Open,
    Resolvers(Vec<String>),
}

impl SettlementPolicy {
    pub fn authority(&self) -> Box<dyn SettlementAuthority> {
        match self {
            SettlementPolicy::Open => Box::new(Unrestricted),
            SettlementPolicy::Resolvers(ids) => Box::new(ResolverSet::new(ids.iter().cloned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub fee_rate: FeeRate,
    pub fee_recipient: Option<String>,
    pub custody_account: String,
    pub settlement: SettlementPolicy,
    pub bind_addr: SocketAddr,
    pub state_path: PathBuf,
}

impl MarketConfig {
    /// Load `.env` (if any) and read `MARKET_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let numerator = parse_or(&var, "MARKET_FEE_NUMERATOR", DEFAULT_FEE_NUMERATOR)?;
        let denominator = parse_or(&var, "MARKET_FEE_DENOMINATOR", DEFAULT_FEE_DENOMINATOR)?;
        let fee_rate = FeeRate::new(numerator, denominator)?;

        let fee_recipient = non_empty(var("MARKET_FEE_RECIPIENT"));
        let custody_account = non_empty(var("MARKET_CUSTODY_ACCOUNT"))
            .unwrap_or_else(|| DEFAULT_CUSTODY_ACCOUNT.to_string());

        let open_settlement = parse_or(&var, "MARKET_OPEN_SETTLEMENT", false)?;
        let resolvers: Vec<String> = var("MARKET_RESOLVERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        let settlement = if open_settlement {
            SettlementPolicy::Open
        } else if !resolvers.is_empty() {
            SettlementPolicy::Resolvers(resolvers)
        } else {
            return Err(ConfigError::NoResolvers);
        };

        let bind_addr: SocketAddr = parse_or(&var, "MARKET_BIND_ADDR", default_bind_addr())?;
        let state_path = non_empty(var("MARKET_STATE_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));

        Ok(Self {
            fee_rate,
            fee_recipient,
            custody_account,
            settlement,
            bind_addr,
            state_path,
        })
    }

    pub fn log_summary(&self) {
        tracing::info!(
            fee_rate = %self.fee_rate,
            fee_recipient = self.fee_recipient.as_deref().unwrap_or("<none>"),
            custody = %self.custody_account,
            bind = %self.bind_addr,
            state = %self.state_path.display(),
            "market configuration loaded"
        );
        match &self.settlement {
            SettlementPolicy::Open => tracing::warn!("settlement is open to any caller"),
            SettlementPolicy::Resolvers(ids) => tracing::info!(resolvers = ids.len(), "settlement restricted to resolvers"),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_empty(var(key)) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_resolvers() {
        let config = MarketConfig::from_vars(vars(&[("MARKET_RESOLVERS", "ORACLE, ADMIN ,")])).unwrap();

        assert_eq!(config.fee_rate, FeeRate::default());
        assert_eq!(config.fee_recipient, None);
        assert_eq!(config.custody_account, DEFAULT_CUSTODY_ACCOUNT);
        assert_eq!(config.bind_addr.port(), 1234);
        assert_eq!(
            config.settlement,
            SettlementPolicy::Resolvers(vec!["ORACLE".into(), "ADMIN".into()])
        );
        assert!(config.settlement.authority().may_settle("ADMIN"));
        assert!(!config.settlement.authority().may_settle("ALICE"));
    }

    #[test]
    fn test_requires_explicit_settlement_policy() {
        let err = MarketConfig::from_vars(vars(&[])).unwrap_err();
        assert_eq!(err, ConfigError::NoResolvers);

        let config = MarketConfig::from_vars(vars(&[("MARKET_OPEN_SETTLEMENT", "true")])).unwrap();
        assert_eq!(config.settlement, SettlementPolicy::Open);
    }

    #[test]
    fn test_custom_fee_and_recipient() {
        let config = MarketConfig::from_vars(vars(&[
            ("MARKET_RESOLVERS", "ORACLE"),
            ("MARKET_FEE_NUMERATOR", "1"),
            ("MARKET_FEE_DENOMINATOR", "100"),
            ("MARKET_FEE_RECIPIENT", "TREASURY"),
            ("MARKET_BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();

        assert_eq!(config.fee_rate, FeeRate::new(1, 100).unwrap());
        assert_eq!(config.fee_recipient.as_deref(), Some("TREASURY"));
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MarketConfig::from_vars(vars(&[
            ("MARKET_RESOLVERS", "ORACLE"),
            ("MARKET_FEE_NUMERATOR", "five"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MARKET_FEE_NUMERATOR"));

        let err = MarketConfig::from_vars(vars(&[
            ("MARKET_RESOLVERS", "ORACLE"),
            ("MARKET_FEE_NUMERATOR", "2"),
            ("MARKET_FEE_DENOMINATOR", "1"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidFeeRate { numerator: 2, denominator: 1 });
    }
}
