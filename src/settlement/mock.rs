//! In-process settlement.
//!
//! Resolves after a fixed delay. Used when no real wager service is
//! configured, and as a deterministic collaborator in tests. Only a count
//! of submissions is kept, so a long-running process holds no history.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::{SettlementReceipt, SettlementRequest, SettlementService};

const SERVICE_NAME: &str = "mock";

pub struct MockSettlement {
    delay: Duration,
    /// When set, every submission is rejected with this message.
    reject_with: Option<String>,
    submissions: AtomicUsize,
}

impl MockSettlement {
    /// A mock that accepts everything after `delay`.
    pub fn accepting(delay: Duration) -> Self {
        Self {
            delay,
            reject_with: None,
            submissions: AtomicUsize::new(0),
        }
    }

    /// A mock that rejects everything after `delay`.
    pub fn rejecting(delay: Duration, message: &str) -> Self {
        Self {
            delay,
            reject_with: Some(message.to_string()),
            submissions: AtomicUsize::new(0),
        }
    }

    /// Requests seen so far, accepted or not.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SettlementService for MockSettlement {
    async fn submit(&self, request: &SettlementRequest) -> Result<SettlementReceipt> {
        let seen = self.submissions.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            request_id = %request.request_id,
            delay_ms = self.delay.as_millis() as u64,
            seen,
            "Mock settlement received request"
        );

        tokio::time::sleep(self.delay).await;

        if let Some(ref message) = self.reject_with {
            anyhow::bail!("{message}");
        }

        let reference = format!("mock-{}", uuid::Uuid::new_v4());
        info!(
            request_id = %request.request_id,
            reference = %reference,
            legs = request.selections.len(),
            stake = format!("${:.2}", request.total_stake),
            "Mock settlement accepted"
        );
        Ok(SettlementReceipt {
            reference,
            request_id: request.request_id,
            accepted_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        SERVICE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
