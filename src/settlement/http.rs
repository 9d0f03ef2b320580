//! HTTP wager service client.
//!
//! Posts the slip snapshot as JSON to `{base_url}/wagers`.
//! Auth: optional `Authorization: Bearer {key}` header.
//!
//! Expected response body:
//! `{ "accepted": bool, "reference": str?, "code": str?, "message": str? }`

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{SettlementReceipt, SettlementRequest, SettlementService};

const SERVICE_NAME: &str = "http";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WagerResponse {
    accepted: bool,
    #[serde(default)]
    reference: Option<String>,
    /// Machine-readable rejection code, e.g. "ODDS_CHANGED".
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct HttpSettlement {
    http: Client,
    base_url: String,
    api_key: Option<Secret<String>>,
}

impl HttpSettlement {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BETSLIP/0.1.0")
            .build()
            .context("Failed to build settlement HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(Secret::new),
        })
    }

    fn wagers_url(&self) -> String {
        format!("{}/wagers", self.base_url)
    }

    fn interpret(request_id: Uuid, resp: WagerResponse) -> Result<SettlementReceipt> {
        if !resp.accepted {
            let message = resp.message.unwrap_or_else(|| "wager rejected".to_string());
            match resp.code {
                Some(code) => anyhow::bail!("{message} [{code}]"),
                None => anyhow::bail!("{message}"),
            }
        }
        let reference = resp
            .reference
            .unwrap_or_else(|| request_id.to_string());
        Ok(SettlementReceipt {
            reference,
            request_id,
            accepted_at: Utc::now(),
        })
    }
}

#[async_trait]
impl SettlementService for HttpSettlement {
    async fn submit(&self, request: &SettlementRequest) -> Result<SettlementReceipt> {
        let url = self.wagers_url();
        debug!(url = %url, request_id = %request.request_id, "Submitting wagers");

        let mut builder = self.http.post(&url).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let resp = builder
            .send()
            .await
            .context("Settlement request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, request_id = %request.request_id, "Settlement service returned error status");
            anyhow::bail!("Settlement service returned {status}: {body}");
        }

        let parsed: WagerResponse = resp
            .json()
            .await
            .context("Failed to parse settlement response")?;

        let receipt = Self::interpret(request.request_id, parsed)?;
        info!(
            request_id = %request.request_id,
            reference = %receipt.reference,
            legs = request.selections.len(),
            "Wagers accepted"
        );
        Ok(receipt)
    }

    fn name(&self) -> &'static str {
        SERVICE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
