use serde::{Deserialize, Serialize};

/// Odds are reported in parts-per-thousand.
pub const ODDS_SCALE: u64 = 1000;

/// Each side's share of the combined pool, floor-rounded independently,
/// so `a + b` may fall short of `ODDS_SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    pub a: u64,
    pub b: u64,
}

impl Odds {
    pub const EVEN: Odds = Odds {
        a: ODDS_SCALE / 2,
        b: ODDS_SCALE / 2,
    };

    pub fn from_totals(total_a: u64, total_b: u64) -> Self {
        let total = total_a as u128 + total_b as u128;
        if total == 0 {
            return Self::EVEN;
        }
        let share = |side: u64| (ODDS_SCALE as u128 * side as u128 / total) as u64;
        Self {
            a: share(total_a),
            b: share(total_b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_is_even() {
        assert_eq!(Odds::from_totals(0, 0), Odds { a: 500, b: 500 });
    }

    #[test]
    fn test_shares_floor_independently() {
        let odds = Odds::from_totals(1, 2);
        assert_eq!(odds, Odds { a: 333, b: 666 });
        assert_eq!(odds.a + odds.b, 999);
    }

    #[test]
    fn test_one_sided_pool() {
        assert_eq!(Odds::from_totals(0, 42), Odds { a: 0, b: 1000 });
    }

    #[test]
    fn test_large_totals_do_not_overflow() {
        let odds = Odds::from_totals(u64::MAX / 2, u64::MAX / 2);
        assert_eq!(odds, Odds { a: 500, b: 500 });
    }
}
