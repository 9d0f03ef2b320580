//! Bet slip API route handlers.
//!
//! All endpoints return JSON. Each session id maps to its own ledger and
//! stake board. Only routes that store something create a session; reads
//! and no-op mutations on an unknown session answer with an empty slip.
//! Sessions end on `DELETE` or after sitting idle.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::ledger::stake_keys::{StakeBoard, StakeKey};
use crate::ledger::{StakeLimits, WagerLedger};
use crate::odds::AmericanOdds;
use crate::settlement::SettlementService;
use crate::types::{PlacementResult, Selection, SlipView, Stake, WagerError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything one user session owns.
pub struct Session {
    pub ledger: WagerLedger,
    pub stakes: StakeBoard,
    last_active: Instant,
}

impl Session {
    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// Registry of live sessions plus what a new ledger gets injected with.
pub struct ApiState {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    settlement: Arc<dyn SettlementService>,
    limits: StakeLimits,
    placement_timeout: Duration,
}

pub type AppState = Arc<ApiState>;

impl ApiState {
    pub fn new(
        settlement: Arc<dyn SettlementService>,
        limits: StakeLimits,
        placement_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            settlement,
            limits,
            placement_timeout,
        }
    }

    pub async fn existing_session(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Fetch a session, creating an empty one if it does not exist yet.
    pub async fn open_session(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.read().await.get(id) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session = id, "Session created");
            Arc::new(Mutex::new(Session {
                ledger: WagerLedger::new(
                    Arc::clone(&self.settlement),
                    self.limits.clone(),
                    self.placement_timeout,
                ),
                stakes: StakeBoard::new(),
                last_active: Instant::now(),
            }))
        });
        Arc::clone(entry)
    }

    /// Drop a session. Returns whether it existed. A placement already in
    /// flight still completes against its own handle.
    pub async fn end_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session = id, "Session ended");
        }
        removed
    }

    /// Drop sessions untouched for at least `max_idle`. Sessions that are
    /// busy or have a placement in flight are kept for the next sweep.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => {
                session.ledger.is_placement_in_flight() || session.idle_for() < max_idle
            }
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Raw selection as posted by a client. Validated into a `Selection`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRequest {
    /// Defaults to the odds cell's stake key, or the three parts joined
    /// with '-' when they cannot form one.
    #[serde(default)]
    pub id: Option<String>,
    pub event_id: String,
    pub event_name: String,
    pub market_id: String,
    pub market_name: String,
    pub selection_id: String,
    pub selection_name: String,
    pub odds: i32,
    /// Defaults to whatever was typed into the odds cell, or zero.
    #[serde(default)]
    pub stake: Option<Decimal>,
    #[serde(default)]
    pub is_live: bool,
}

impl SelectionRequest {
    fn into_selection(self, board: &StakeBoard) -> Result<Selection, WagerError> {
        let odds = AmericanOdds::new(self.odds)?;
        let stake = self.stake.map(Stake::new).transpose()?;

        // The stake key is only a default source; ids such as "first-half"
        // cannot form one and must not block the selection.
        let key = match (&self.id, stake) {
            (Some(_), Some(_)) => None,
            _ => StakeKey::new(&self.event_id, &self.market_id, &self.selection_id).ok(),
        };
        let stake = match (stake, &key) {
            (Some(stake), _) => stake,
            (None, Some(key)) => board.stake_for(key),
            (None, None) => Stake::ZERO,
        };
        let id = match (self.id, key) {
            (Some(id), _) => id,
            (None, Some(key)) => key.to_string(),
            (None, None) => format!("{}-{}-{}", self.event_id, self.market_id, self.selection_id),
        };

        Ok(Selection {
            id,
            event_id: self.event_id,
            market_id: self.market_id,
            market_name: self.market_name,
            selection_id: self.selection_id,
            selection_name: self.selection_name,
            odds,
            stake,
            event_name: self.event_name,
            is_live: self.is_live,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeBody {
    pub stake: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeEntry {
    pub key: String,
    pub stake: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    /// Client sent something the ledger refuses to hold.
    Invalid(WagerError),
    NotFound(String),
    Internal(String),
}

impl From<WagerError> for ApiError {
    fn from(e: WagerError) -> Self {
        ApiError::Invalid(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.session_count().await,
    })
}

pub async fn get_slip(State(state): State<AppState>, Path(session): Path<String>) -> Json<SlipView> {
    match state.existing_session(&session).await {
        Some(handle) => {
            let mut guard = handle.lock().await;
            guard.touch();
            Json(guard.ledger.view())
        }
        None => Json(SlipView::default()),
    }
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.end_session(&session).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no session {session:?}")))
    }
}

pub async fn add_selection(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<SelectionRequest>,
) -> Result<Json<SlipView>, ApiError> {
    let handle = match state.existing_session(&session).await {
        Some(handle) => handle,
        None => {
            // Refuse bad input before it can create a session. A new
            // session's stake board is empty.
            body.clone().into_selection(&StakeBoard::new())?;
            state.open_session(&session).await
        }
    };
    let mut guard = handle.lock().await;
    let selection = body.into_selection(&guard.stakes)?;
    guard.ledger.add_selection(selection);
    guard.touch();
    Ok(Json(guard.ledger.view()))
}

pub async fn remove_selection(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, String)>,
) -> Json<SlipView> {
    let Some(handle) = state.existing_session(&session).await else {
        return Json(SlipView::default());
    };
    let mut guard = handle.lock().await;
    guard.ledger.remove_selection(&id);
    guard.touch();
    Json(guard.ledger.view())
}

pub async fn update_stake(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, String)>,
    Json(body): Json<StakeBody>,
) -> Result<Json<SlipView>, ApiError> {
    let stake = Stake::new(body.stake)?;
    let Some(handle) = state.existing_session(&session).await else {
        return Ok(Json(SlipView::default()));
    };
    let mut guard = handle.lock().await;
    guard.ledger.update_stake(&id, stake);
    guard.touch();
    Ok(Json(guard.ledger.view()))
}

pub async fn clear_slip(State(state): State<AppState>, Path(session): Path<String>) -> Json<SlipView> {
    let Some(handle) = state.existing_session(&session).await else {
        return Json(SlipView::default());
    };
    let mut guard = handle.lock().await;
    guard.ledger.clear();
    guard.touch();
    Json(guard.ledger.view())
}

/// Submit the slip. The session lock is released while settlement runs.
/// The work is spawned so the placement reaches the service and its result
/// lands in the ledger even if the client disconnects.
pub async fn place_bet(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<PlacementResult>, ApiError> {
    let Some(handle) = state.existing_session(&session).await else {
        return Ok(Json(PlacementResult::failure(WagerError::NoSelections)));
    };

    let task = tokio::spawn(async move {
        let pending = {
            let mut guard = handle.lock().await;
            guard.touch();
            match guard.ledger.begin_placement() {
                Ok(p) => p,
                Err(e) => {
                    warn!(session = %session, error = %e, "Placement refused");
                    return PlacementResult::failure(e);
                }
            }
        };
        let outcome = pending.submit().await;
        let mut guard = handle.lock().await;
        guard.touch();
        guard.ledger.finish_placement(outcome)
    });

    match task.await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = %e, "Placement task failed");
            Err(ApiError::Internal("placement task failed".to_string()))
        }
    }
}

pub async fn list_stakes(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<Vec<StakeEntry>> {
    let Some(handle) = state.existing_session(&session).await else {
        return Json(Vec::new());
    };
    let mut guard = handle.lock().await;
    guard.touch();
    let mut entries: Vec<StakeEntry> = guard
        .stakes
        .iter()
        .map(|(key, stake)| StakeEntry {
            key: key.to_string(),
            stake: stake.amount(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    Json(entries)
}

pub async fn set_stake(
    State(state): State<AppState>,
    Path((session, key)): Path<(String, String)>,
    Json(body): Json<StakeBody>,
) -> Result<StatusCode, ApiError> {
    let key: StakeKey = key.parse()?;
    let stake = Stake::new(body.stake)?;
    let handle = state.open_session(&session).await;
    let mut guard = handle.lock().await;
    guard.stakes.set(key, stake);
    guard.touch();
    Ok(StatusCode::NO_CONTENT)
}
