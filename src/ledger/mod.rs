//! Wager ledger — the authoritative state of one user's bet slip.
//!
//! Holds the pending selections in insertion order, keeps the stake and
//! payout totals in step with every mutation, and coordinates submission to
//! the injected settlement service. One ledger per session; nothing here is
//! global.

pub mod placement;
pub mod stake_keys;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::settlement::SettlementService;
use crate::types::{Selection, SelectionView, SlipView, Stake, WagerError};

pub use placement::{PendingPlacement, PlacementOutcome};

// ---------------------------------------------------------------------------
// Stake limits
// ---------------------------------------------------------------------------

/// Per-selection stake bounds, checked when the slip is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeLimits {
    pub min_stake: Decimal,
    pub max_stake: Decimal,
}

impl Default for StakeLimits {
    fn default() -> Self {
        Self {
            min_stake: dec!(1),
            max_stake: dec!(10000),
        }
    }
}

impl StakeLimits {
    pub fn check(&self, selection: &Selection) -> Result<(), WagerError> {
        let stake = selection.stake.amount();
        if stake < self.min_stake {
            return Err(WagerError::StakeBelowMinimum {
                selection_id: selection.id.clone(),
                stake,
                minimum: self.min_stake,
            });
        }
        if stake > self.max_stake {
            return Err(WagerError::StakeAboveMaximum {
                selection_id: selection.id.clone(),
                stake,
                maximum: self.max_stake,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub struct WagerLedger {
    selections: Vec<Selection>,
    total_stake: Decimal,
    total_potential_payout: Decimal,
    limits: StakeLimits,
    settlement: Arc<dyn SettlementService>,
    placement_timeout: Duration,
    /// Set while a `PendingPlacement` or its outcome is alive; cleared when
    /// either is dropped.
    placement_in_flight: Arc<AtomicBool>,
}

impl WagerLedger {
    pub fn new(
        settlement: Arc<dyn SettlementService>,
        limits: StakeLimits,
        placement_timeout: Duration,
    ) -> Self {
        Self {
            selections: Vec::new(),
            total_stake: Decimal::ZERO,
            total_potential_payout: Decimal::ZERO,
            limits,
            settlement,
            placement_timeout,
            placement_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a selection, or replace the one with the same id in place.
    pub fn add_selection(&mut self, selection: Selection) {
        match self.selections.iter_mut().find(|s| s.id == selection.id) {
            Some(existing) => {
                debug!(id = %selection.id, odds = %selection.odds, stake = %selection.stake, "Selection replaced");
                *existing = selection;
            }
            None => {
                debug!(id = %selection.id, odds = %selection.odds, stake = %selection.stake, "Selection added");
                self.selections.push(selection);
            }
        }
        self.recompute_totals();
    }

    /// Remove a selection. Unknown ids are ignored.
    pub fn remove_selection(&mut self, id: &str) {
        let before = self.selections.len();
        self.selections.retain(|s| s.id != id);
        if self.selections.len() != before {
            debug!(id, "Selection removed");
            self.recompute_totals();
        }
    }

    /// Change the stake on a selection. Unknown ids are ignored.
    pub fn update_stake(&mut self, id: &str, stake: Stake) {
        if let Some(selection) = self.selections.iter_mut().find(|s| s.id == id) {
            debug!(id, from = %selection.stake, to = %stake, "Stake updated");
            selection.stake = stake;
            self.recompute_totals();
        }
    }

    pub fn clear(&mut self) {
        if !self.selections.is_empty() {
            debug!(count = self.selections.len(), "Slip cleared");
        }
        self.selections.clear();
        self.recompute_totals();
    }

    fn recompute_totals(&mut self) {
        self.total_stake = self.selections.iter().map(|s| s.stake.amount()).sum();
        self.total_potential_payout = self.selections.iter().map(Selection::potential_payout).sum();
    }

    // -- Accessors ---------------------------------------------------------

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn get(&self, id: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn total_stake(&self) -> Decimal {
        self.total_stake
    }

    /// Sum of total returns (stake included) across all selections.
    pub fn total_potential_payout(&self) -> Decimal {
        self.total_potential_payout
    }

    pub fn total_profit(&self) -> Decimal {
        self.total_potential_payout - self.total_stake
    }

    pub fn limits(&self) -> &StakeLimits {
        &self.limits
    }

    pub fn is_placement_in_flight(&self) -> bool {
        self.placement_in_flight.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> SlipView {
        SlipView {
            selections: self
                .selections
                .iter()
                .map(|s| SelectionView {
                    potential_payout: s.potential_payout(),
                    selection: s.clone(),
                })
                .collect(),
            total_stake: self.total_stake,
            total_potential_payout: self.total_potential_payout,
            placement_in_flight: self.is_placement_in_flight(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
