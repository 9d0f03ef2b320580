//! Shared types for the bet slip.
//!
//! Value types here validate on construction so the ledger never holds a
//! zero-odds selection or a negative stake.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::stake_keys::StakeKey;
use crate::odds::AmericanOdds;

// ---------------------------------------------------------------------------
// Stake
// ---------------------------------------------------------------------------

/// Amount risked on a selection. Always within `0..=Stake::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Stake(Decimal);

impl Stake {
    pub const ZERO: Stake = Stake(Decimal::ZERO);

    /// Largest stake a selection can carry. At any `i32` odds the payout of
    /// a slip of such stakes stays far inside `Decimal`'s range.
    pub const MAX: Stake = Stake(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    pub fn new(amount: Decimal) -> Result<Self, WagerError> {
        if amount < Decimal::ZERO {
            return Err(WagerError::NegativeStake(amount));
        }
        if amount > Self::MAX.0 {
            return Err(WagerError::StakeTooLarge(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Stake {
    type Error = WagerError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Stake::new(amount)
    }
}

impl From<Stake> for Decimal {
    fn from(stake: Stake) -> Self {
        stake.0
    }
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A single leg on the bet slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub event_id: String,
    /// Bet category key: "moneyline" | "spread" | "total" | ...
    pub market_id: String,
    pub market_name: String,
    /// Chosen outcome key (team, "over", "under").
    pub selection_id: String,
    pub selection_name: String,
    pub odds: AmericanOdds,
    pub stake: Stake,
    /// Denormalized from the event for display.
    pub event_name: String,
    #[serde(default)]
    pub is_live: bool,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} | {} {} @ {} | stake {} -> {}",
            if self.is_live { "[LIVE] " } else { "" },
            self.event_name,
            self.market_name,
            self.selection_name,
            self.odds,
            self.stake,
            self.potential_payout().round_dp(2),
        )
    }
}

impl Selection {
    /// Total return if this leg wins (stake included).
    pub fn potential_payout(&self) -> Decimal {
        self.odds.payout(self.stake.amount())
    }

    /// Winnings excluding the stake.
    pub fn profit(&self) -> Decimal {
        self.odds.profit(self.stake.amount())
    }

    /// The stake-board key of the odds cell this selection came from.
    pub fn stake_key(&self) -> Result<StakeKey, WagerError> {
        StakeKey::new(&self.event_id, &self.market_id, &self.selection_id)
    }

    #[cfg(test)]
    pub fn sample(id: &str, odds: i32, stake: Decimal) -> Self {
        Selection {
            id: id.to_string(),
            event_id: format!("evt-{id}"),
            market_id: "moneyline".to_string(),
            market_name: "Moneyline".to_string(),
            selection_id: "home".to_string(),
            selection_name: "Lakers".to_string(),
            odds: AmericanOdds::new(odds).unwrap(),
            stake: Stake::new(stake).unwrap(),
            event_name: "Lakers vs Celtics".to_string(),
            is_live: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Outcome of submitting the slip. Produced once per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Settlement reference when accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PlacementResult {
    pub fn success(reference: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            reference: Some(reference.into()),
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            reference: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A selection together with its derived payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionView {
    #[serde(flatten)]
    pub selection: Selection,
    pub potential_payout: Decimal,
}

/// Serializable snapshot of a ledger. The default is an empty slip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlipView {
    pub selections: Vec<SelectionView>,
    pub total_stake: Decimal,
    pub total_potential_payout: Decimal,
    pub placement_in_flight: bool,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WagerError {
    #[error("invalid odds {0}: American odds cannot be zero")]
    InvalidOdds(i32),

    #[error("unparseable odds: {0:?}")]
    UnparseableOdds(String),

    #[error("invalid stake {0}: stake cannot be negative")]
    NegativeStake(Decimal),

    #[error("invalid stake {0}: stake cannot exceed 1000000000")]
    StakeTooLarge(Decimal),

    #[error("invalid stake key: {0}")]
    InvalidStakeKey(String),

    #[error("no selections")]
    NoSelections,

    #[error("placement already in progress")]
    PlacementInFlight,

    #[error("stake ${stake:.2} on {selection_id} is below the ${minimum:.2} minimum")]
    StakeBelowMinimum {
        selection_id: String,
        stake: Decimal,
        minimum: Decimal,
    },

    #[error("stake ${stake:.2} on {selection_id} exceeds the ${maximum:.2} maximum")]
    StakeAboveMaximum {
        selection_id: String,
        stake: Decimal,
        maximum: Decimal,
    },

    #[error("settlement failed ({service}): {message}")]
    Settlement { service: String, message: String },

    #[error("settlement timed out after {0:?}")]
    SettlementTimeout(std::time::Duration),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stake_rejects_negative() {
        assert!(matches!(Stake::new(dec!(-0.01)), Err(WagerError::NegativeStake(_))));
        assert_eq!(Stake::new(dec!(0)).unwrap(), Stake::ZERO);
        assert_eq!(Stake::new(dec!(12.5)).unwrap().amount(), dec!(12.5));
    }

    #[test]
    fn test_stake_rejects_amounts_above_ceiling() {
        assert_eq!(Stake::new(dec!(1000000000)).unwrap(), Stake::MAX);
        assert!(matches!(
            Stake::new(dec!(1000000000.01)),
            Err(WagerError::StakeTooLarge(_))
        ));
        assert!(matches!(
            Stake::new(dec!(50000000000000000000000000000)),
            Err(WagerError::StakeTooLarge(_))
        ));
        assert!(serde_json::from_str::<Stake>("50000000000000000000000000000").is_err());
    }

    #[test]
    fn test_max_stake_at_extreme_odds_does_not_overflow() {
        let long_shot = Selection::sample("a", i32::MAX, Stake::MAX.amount());
        assert!(long_shot.potential_payout() > Stake::MAX.amount());
        let heavy = Selection::sample("b", i32::MIN, Stake::MAX.amount());
        assert!(heavy.potential_payout() > Stake::MAX.amount());
        let tiny_fav = Selection::sample("c", -1, Stake::MAX.amount());
        assert_eq!(tiny_fav.potential_payout(), dec!(101000000000));
    }

    #[test]
    fn test_stake_display() {
        assert_eq!(Stake::new(dec!(7.5)).unwrap().to_string(), "$7.50");
    }

    #[test]
    fn test_selection_payout_and_profit() {
        let sel = Selection::sample("a", 120, dec!(50));
        assert_eq!(sel.potential_payout(), dec!(110));
        assert_eq!(sel.profit(), dec!(60));
    }

    #[test]
    fn test_selection_display() {
        let mut sel = Selection::sample("a", -110, dec!(110));
        sel.is_live = true;
        let s = sel.to_string();
        assert!(s.starts_with("[LIVE] Lakers vs Celtics"));
        assert!(s.contains("@ -110"));
        assert!(s.contains("-> 210"));
    }

    #[test]
    fn test_selection_deserialize_validates() {
        let json = serde_json::json!({
            "id": "s1",
            "event_id": "e1",
            "market_id": "spread",
            "market_name": "Spread",
            "selection_id": "away",
            "selection_name": "Celtics +2.5",
            "odds": 0,
            "stake": 10,
            "event_name": "Lakers vs Celtics"
        });
        assert!(serde_json::from_value::<Selection>(json.clone()).is_err());

        let mut ok = json;
        ok["odds"] = serde_json::json!(-110);
        let sel: Selection = serde_json::from_value(ok).unwrap();
        assert!(!sel.is_live);
        assert_eq!(sel.odds.value(), -110);
    }

    #[test]
    fn test_negative_stake_rejected_on_deserialize() {
        assert!(serde_json::from_str::<Stake>("-5").is_err());
    }

    #[test]
    fn test_selection_stake_key() {
        let sel = Selection::sample("a", 150, dec!(10));
        assert_eq!(sel.stake_key().unwrap().to_string(), "evt-a-moneyline-home");
    }

    #[test]
    fn test_placement_result_constructors() {
        let ok = PlacementResult::success("ref-1");
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert_eq!(ok.reference.as_deref(), Some("ref-1"));

        let err = PlacementResult::failure(WagerError::NoSelections);
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("no selections"));
    }

    #[test]
    fn test_placement_result_serialization_skips_empty() {
        let json = serde_json::to_value(PlacementResult::failure("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("reference").is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = WagerError::StakeAboveMaximum {
            selection_id: "s1".into(),
            stake: dec!(20000),
            maximum: dec!(10000),
        };
        assert_eq!(err.to_string(), "stake $20000.00 on s1 exceeds the $10000.00 maximum");
        assert_eq!(
            WagerError::SettlementTimeout(std::time::Duration::from_secs(30)).to_string(),
            "settlement timed out after 30s"
        );
    }
}
