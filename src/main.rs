//! BETSLIP — wager ledger and bet-slip service
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the settlement provider into the session registry, and serves
//! the bet slip API until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use betslip::api;
use betslip::api::routes::ApiState;
use betslip::config::{self, AppConfig, LoggingConfig};
use betslip::settlement::http::HttpSettlement;
use betslip::settlement::mock::MockSettlement;
use betslip::settlement::SettlementService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging(&cfg.logging);

    info!(
        name = %cfg.service.name,
        port = cfg.service.port,
        currency = %cfg.service.currency,
        min_stake = %cfg.limits.min_stake,
        max_stake = %cfg.limits.max_stake,
        "BETSLIP starting up"
    );

    let settlement = build_settlement(&cfg)?;
    info!(provider = settlement.name(), timeout_secs = cfg.settlement.timeout_secs, "Settlement provider ready");

    let state = Arc::new(ApiState::new(
        settlement,
        cfg.limits.stake_limits(),
        cfg.settlement.timeout(),
    ));
    let sweeper = api::spawn_session_sweeper(Arc::clone(&state), cfg.service.session_idle());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received.");
    };

    api::serve(state, cfg.service.port, shutdown).await?;
    sweeper.abort();

    info!("BETSLIP shut down cleanly.");
    Ok(())
}

/// Pick the settlement provider named in the config.
fn build_settlement(cfg: &AppConfig) -> Result<Arc<dyn SettlementService>> {
    let s = &cfg.settlement;
    match s.provider.as_str() {
        "http" => {
            let base_url = s
                .base_url
                .as_deref()
                .context("settlement.base_url is required for the http provider")?;
            let api_key = match s.api_key_env.as_deref() {
                Some(env) => Some(AppConfig::resolve_env(env)?),
                None => None,
            };
            Ok(Arc::new(HttpSettlement::new(base_url, api_key, s.timeout())?))
        }
        "mock" => Ok(Arc::new(mock_settlement(cfg))),
        other => {
            warn!(provider = other, "Unknown settlement provider, defaulting to mock");
            Ok(Arc::new(mock_settlement(cfg)))
        }
    }
}

fn mock_settlement(cfg: &AppConfig) -> MockSettlement {
    if cfg.settlement.mock_reject {
        MockSettlement::rejecting(cfg.settlement.mock_delay(), "settlement rejected (mock)")
    } else {
        MockSettlement::accepting(cfg.settlement.mock_delay())
    }
}

/// Plain or JSON output on stderr, filtered by `RUST_LOG` or the config.
fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let json = logging.json || std::env::var_os("BETSLIP_LOG_JSON").is_some();

    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().compact().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
