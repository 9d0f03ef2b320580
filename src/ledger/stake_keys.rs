//! Stake tracking for odds cells that have no selection yet.
//!
//! A betting table keeps one stake input per odds cell. Each cell is keyed
//! by `(event_id, market_id, side)` and rendered as
//! `"{event_id}-{market_id}-{side}"`. Event ids may themselves contain `-`
//! (UUIDs do), so `market_id` and `side` must not, and parsing splits from
//! the right.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{Stake, WagerError};

const SEPARATOR: char = '-';

/// Composite key of a single odds cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StakeKey {
    event_id: String,
    market_id: String,
    side: String,
}

impl StakeKey {
    pub fn new(event_id: &str, market_id: &str, side: &str) -> Result<Self, WagerError> {
        if event_id.is_empty() || market_id.is_empty() || side.is_empty() {
            return Err(WagerError::InvalidStakeKey(format!(
                "empty component in ({event_id:?}, {market_id:?}, {side:?})"
            )));
        }
        for (name, part) in [("market_id", market_id), ("side", side)] {
            if part.contains(SEPARATOR) {
                return Err(WagerError::InvalidStakeKey(format!(
                    "{name} {part:?} must not contain '{SEPARATOR}'"
                )));
            }
        }
        Ok(Self {
            event_id: event_id.to_string(),
            market_id: market_id.to_string(),
            side: side.to_string(),
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn side(&self) -> &str {
        &self.side
    }
}

impl fmt::Display for StakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", self.event_id, self.market_id, self.side)
    }
}

impl std::str::FromStr for StakeKey {
    type Err = WagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(side), Some(market_id), Some(event_id)) => {
                StakeKey::new(event_id, market_id, side)
            }
            _ => Err(WagerError::InvalidStakeKey(format!(
                "{s:?} is not of the form event-market-side"
            ))),
        }
    }
}

impl TryFrom<String> for StakeKey {
    type Error = WagerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StakeKey> for String {
    fn from(key: StakeKey) -> Self {
        key.to_string()
    }
}

// ---------------------------------------------------------------------------
// Stake board
// ---------------------------------------------------------------------------

/// Per-cell stake inputs for one session.
#[derive(Debug, Clone, Default)]
pub struct StakeBoard {
    stakes: HashMap<StakeKey, Stake>,
}

impl StakeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the stake typed into a cell. A zero stake clears the cell.
    pub fn set(&mut self, key: StakeKey, stake: Stake) {
        if stake.is_zero() {
            self.stakes.remove(&key);
        } else {
            self.stakes.insert(key, stake);
        }
    }

    pub fn get(&self, key: &StakeKey) -> Option<Stake> {
        self.stakes.get(key).copied()
    }

    /// Stake for a cell, zero if nothing was entered.
    pub fn stake_for(&self, key: &StakeKey) -> Stake {
        self.get(key).unwrap_or(Stake::ZERO)
    }

    pub fn remove(&mut self, key: &StakeKey) -> Option<Stake> {
        self.stakes.remove(key)
    }

    pub fn clear(&mut self) {
        self.stakes.clear();
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StakeKey, &Stake)> {
        self.stakes.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
