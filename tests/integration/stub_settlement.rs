//! Stub settlement service for integration testing.
//!
//! Accepts or rejects on demand and records every submission, all
//! in-memory with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use betslip::settlement::{SettlementReceipt, SettlementRequest, SettlementService};

/// A deterministic settlement service.
///
/// Clones share state, so a test can keep a handle after passing one to
/// the ledger.
#[derive(Clone, Default)]
pub struct StubSettlement {
    requests: Arc<Mutex<Vec<SettlementRequest>>>,
    /// If set, every submission fails with this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl StubSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(msg: &str) -> Self {
        let stub = Self::new();
        stub.set_error(msg);
        stub
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn requests(&self) -> Vec<SettlementRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettlementService for StubSettlement {
    async fn submit(&self, request: &SettlementRequest) -> Result<SettlementReceipt> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(SettlementReceipt {
            reference: format!("stub-{}", self.requests.lock().unwrap().len()),
            request_id: request.request_id,
            accepted_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
