//! American odds and payout math.
//!
//! All payout figures in this crate are **total return** (stake + profit).
//! Profit alone is only ever exposed through [`AmericanOdds::profit`] and
//! is never summed into a payout aggregate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::WagerError;

/// Signed American odds (e.g. `-110`, `+150`). Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AmericanOdds(i32);

impl AmericanOdds {
    /// Even money (+100).
    pub const EVEN: AmericanOdds = AmericanOdds(100);

    pub fn new(value: i32) -> Result<Self, WagerError> {
        if value == 0 {
            return Err(WagerError::InvalidOdds(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn is_favourite(&self) -> bool {
        self.0 < 0
    }

    /// Profit on a winning bet, excluding the returned stake.
    pub fn profit(&self, stake: Decimal) -> Decimal {
        let odds = Decimal::from(self.0);
        if self.0 > 0 {
            stake * odds / dec!(100)
        } else {
            stake * dec!(100) / odds.abs()
        }
    }

    /// Total return on a winning bet (stake + profit).
    pub fn payout(&self, stake: Decimal) -> Decimal {
        if stake.is_zero() {
            return Decimal::ZERO;
        }
        stake + self.profit(stake)
    }

    /// Equivalent decimal (European) odds, i.e. total return per unit staked.
    pub fn to_decimal_odds(&self) -> Decimal {
        Decimal::ONE + self.profit(Decimal::ONE)
    }

    /// Bookmaker-implied win probability, vig included.
    pub fn implied_probability(&self) -> Decimal {
        let odds = Decimal::from(self.0);
        if self.0 > 0 {
            dec!(100) / (odds + dec!(100))
        } else {
            odds.abs() / (odds.abs() + dec!(100))
        }
    }
}

/// Total return for `stake` at raw American `odds`.
///
/// # Panics
///
/// Panics if `odds` is zero, or if `stake` is so large the result leaves
/// `Decimal`'s range. Callers holding user input should go through
/// [`AmericanOdds::new`] and [`crate::types::Stake::new`] instead.
pub fn compute_payout(odds: i32, stake: Decimal) -> Decimal {
    assert!(odds != 0, "American odds must be non-zero");
    debug_assert!(!stake.is_sign_negative(), "stake must be non-negative");
    AmericanOdds(odds).payout(stake)
}

impl TryFrom<i32> for AmericanOdds {
    type Error = WagerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        AmericanOdds::new(value)
    }
}

impl From<AmericanOdds> for i32 {
    fn from(odds: AmericanOdds) -> Self {
        odds.0
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Parses `"+150"`, `"-110"`, `"150"` or `"EVEN"` (case-insensitive).
impl std::str::FromStr for AmericanOdds {
    type Err = WagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("even") || trimmed.eq_ignore_ascii_case("ev") {
            return Ok(AmericanOdds::EVEN);
        }
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let value: i32 = digits
            .parse()
            .map_err(|_| WagerError::UnparseableOdds(s.to_string()))?;
        AmericanOdds::new(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
