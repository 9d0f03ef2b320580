//! Settlement integrations.
//!
//! Defines the `SettlementService` trait the ledger submits slips to, and
//! provides implementations for:
//! - Mock — delayed in-process resolve, for local runs and tests
//! - HTTP — JSON POST to an external wager service

pub mod http;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Selection;

/// Snapshot of a slip handed to the settlement service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub request_id: Uuid,
    pub selections: Vec<Selection>,
    pub total_stake: Decimal,
    pub total_potential_payout: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement that the wagers were accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub reference: String,
    pub request_id: Uuid,
    pub accepted_at: DateTime<Utc>,
}

/// Abstraction over whatever actually books the wagers.
///
/// Retrying a failed `submit` must be safe; partial commits are the
/// service's problem, not the ledger's.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementService: Send + Sync {
    /// Book every selection in the request. An `Err` means nothing was booked.
    async fn submit(&self, request: &SettlementRequest) -> Result<SettlementReceipt>;

    /// Service name for logging.
    fn name(&self) -> &'static str;
}
