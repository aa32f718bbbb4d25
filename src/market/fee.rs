use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Default protocol fee: 0.5% of the combined pool.
pub const DEFAULT_FEE_NUMERATOR: u64 = 5;
pub const DEFAULT_FEE_DENOMINATOR: u64 = 1000;

/// Protocol fee as an exact fraction, fixed at market construction.
///
/// Deserialization goes through `FeeRate::new`, so a persisted book can't
/// carry a rate that would divide by zero or exceed the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeeRate")]
pub struct FeeRate {
    numerator: u64,
    denominator: u64,
}

impl FeeRate {
    /// Requires `denominator > 0` and `numerator <= denominator`.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, ConfigError> {
        if denominator == 0 || numerator > denominator {
            return Err(ConfigError::InvalidFeeRate { numerator, denominator });
        }
        Ok(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// `floor(pool * numerator / denominator)`, never more than `pool`.
    pub fn fee_on(&self, pool: u64) -> u64 {
        let fee = pool as u128 * self.numerator as u128 / self.denominator as u128;
        // numerator <= denominator keeps this within pool
        fee as u64
    }
}

#[derive(Deserialize)]
struct RawFeeRate {
    numerator: u64,
    denominator: u64,
}

impl TryFrom<RawFeeRate> for FeeRate {
    type Error = ConfigError;

    fn try_from(raw: RawFeeRate) -> Result<Self, Self::Error> {
        FeeRate::new(raw.numerator, raw.denominator)
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self {
            numerator: DEFAULT_FEE_NUMERATOR,
            denominator: DEFAULT_FEE_DENOMINATOR,
        }
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
