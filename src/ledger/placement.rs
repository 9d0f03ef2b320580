//! Slip submission.
//!
//! Placement is split into three steps so a host can release its lock on
//! the ledger while the settlement call is in flight:
//!
//! 1. `begin_placement` validates, snapshots the slip and marks it in flight.
//! 2. `PendingPlacement::submit` talks to the settlement service.
//! 3. `finish_placement` applies the outcome and clears the in-flight mark.
//!
//! `place_bet` runs all three for callers that own the ledger outright.
//! A failed placement never touches the selections, so the user can retry.
//! The in-flight mark is held by a guard that travels with the pending
//! placement and its outcome, so dropping either (a cancelled `place_bet`,
//! a caller-side timeout) releases the slip as well.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::WagerLedger;
use crate::settlement::{SettlementReceipt, SettlementRequest, SettlementService};
use crate::types::{PlacementResult, WagerError};

/// Clears the ledger's in-flight flag when dropped.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    request_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.flag.swap(false, Ordering::SeqCst) {
            debug!(request_id = %self.request_id, "Placement released");
        }
    }
}

/// A validated slip snapshot waiting to be submitted.
pub struct PendingPlacement {
    request: SettlementRequest,
    settlement: Arc<dyn SettlementService>,
    timeout: Duration,
    guard: InFlightGuard,
}

/// What came back from the settlement service for one submission.
pub struct PlacementOutcome {
    request: SettlementRequest,
    result: Result<SettlementReceipt, WagerError>,
    guard: InFlightGuard,
}

impl PlacementOutcome {
    pub fn is_accepted(&self) -> bool {
        self.result.is_ok()
    }
}

impl PendingPlacement {
    pub fn request(&self) -> &SettlementRequest {
        &self.request
    }

    /// Submit to the settlement service, bounded by the ledger's timeout.
    pub async fn submit(self) -> PlacementOutcome {
        let service = self.settlement.name();
        let result =
            match tokio::time::timeout(self.timeout, self.settlement.submit(&self.request)).await {
                Ok(Ok(receipt)) => Ok(receipt),
                Ok(Err(e)) => Err(WagerError::Settlement {
                    service: service.to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(WagerError::SettlementTimeout(self.timeout)),
            };
        PlacementOutcome {
            request: self.request,
            result,
            guard: self.guard,
        }
    }
}

impl WagerLedger {
    /// Validate the slip and mark it in flight.
    ///
    /// Fails without side effects if the slip is empty, a placement is
    /// already pending, or any stake is outside the configured limits.
    pub fn begin_placement(&mut self) -> Result<PendingPlacement, WagerError> {
        if self.is_placement_in_flight() {
            return Err(WagerError::PlacementInFlight);
        }
        if self.selections.is_empty() {
            return Err(WagerError::NoSelections);
        }
        for selection in &self.selections {
            self.limits.check(selection)?;
        }

        let request = SettlementRequest {
            request_id: Uuid::new_v4(),
            selections: self.selections.clone(),
            total_stake: self.total_stake,
            total_potential_payout: self.total_potential_payout,
            submitted_at: Utc::now(),
        };
        self.placement_in_flight.store(true, Ordering::SeqCst);
        let guard = InFlightGuard {
            flag: Arc::clone(&self.placement_in_flight),
            request_id: request.request_id,
        };

        info!(
            request_id = %request.request_id,
            legs = request.selections.len(),
            stake = format!("${:.2}", request.total_stake),
            payout = format!("${:.2}", request.total_potential_payout),
            service = self.settlement.name(),
            "Submitting bet slip"
        );

        Ok(PendingPlacement {
            request,
            settlement: Arc::clone(&self.settlement),
            timeout: self.placement_timeout,
            guard,
        })
    }

    /// Apply a settlement outcome.
    ///
    /// On acceptance the submitted selections leave the slip. Anything added,
    /// re-added or re-staked while the call was pending differs from what
    /// was booked and stays.
    pub fn finish_placement(&mut self, outcome: PlacementOutcome) -> PlacementResult {
        let PlacementOutcome { request, result, guard } = outcome;
        drop(guard);

        match result {
            Ok(receipt) => {
                let before = self.selections.len();
                self.selections.retain(|s| !request.selections.contains(s));
                self.recompute_totals();

                info!(
                    request_id = %receipt.request_id,
                    reference = %receipt.reference,
                    legs = request.selections.len(),
                    settled = before - self.selections.len(),
                    remaining = self.selections.len(),
                    "Bet slip placed"
                );
                PlacementResult::success(receipt.reference)
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Bet slip placement failed, selections kept"
                );
                PlacementResult::failure(e)
            }
        }
    }

    /// Submit the slip and wait for the result.
    pub async fn place_bet(&mut self) -> PlacementResult {
        let pending = match self.begin_placement() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Bet slip rejected before submission");
                return PlacementResult::failure(e);
            }
        };
        let outcome = pending.submit().await;
        self.finish_placement(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
