//! Dashboard API route handlers.
//!
//! All endpoints return JSON. The runner publishes into `BoardState` after
//! every round; handlers only read.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::house::{AuctionHouse, RoundReport};
use crate::types::{AgentAccount, RoundPhase, RoundRecord};

/// Number of round summaries kept for `/api/rounds`.
const ROUND_HISTORY: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct BoardState {
    pub status: RwLock<GameStatus>,
    pub standings: RwLock<Vec<AgentAccount>>,
    pub rounds: RwLock<Vec<RoundSummary>>,
    pub latest: RwLock<Option<RoundRecord>>,
}

impl BoardState {
    pub fn new(game_name: impl Into<String>, house: &AuctionHouse) -> Self {
        Self {
            status: RwLock::new(GameStatus {
                game: game_name.into(),
                round: house.round(),
                phase: house.phase(),
                pool_gold: house.gold_in_pool(),
                rounds_remaining: house.rounds_remaining(),
                agents: house.accounts().count(),
                started_at: Utc::now(),
            }),
            standings: RwLock::new(house.standings()),
            rounds: RwLock::new(Vec::new()),
            latest: RwLock::new(None),
        }
    }

    /// Publish a resolved round.
    pub async fn publish(&self, house: &AuctionHouse, report: &RoundReport) {
        {
            let mut status = self.status.write().await;
            status.round = house.round();
            status.phase = house.phase();
            status.pool_gold = house.gold_in_pool();
            status.rounds_remaining = house.rounds_remaining();
        }
        *self.standings.write().await = house.standings();
        *self.latest.write().await = Some(report.record.clone());

        let mut rounds = self.rounds.write().await;
        rounds.push(RoundSummary::from(report));
        if rounds.len() > ROUND_HISTORY {
            let excess = rounds.len() - ROUND_HISTORY;
            rounds.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GameStatus {
    pub game: String,
    pub round: u64,
    pub phase: RoundPhase,
    pub pool_gold: u64,
    pub rounds_remaining: usize,
    pub agents: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: u64,
    pub timestamp: String,
    pub lots_opened: usize,
    pub lots_won: usize,
    pub bids_accepted: usize,
    pub rejections: usize,
    pub gold_spent: u64,
    pub points_awarded: u64,
    pub pool_paid: u64,
    pub pool_minted: u64,
    pub pool_gold_after: u64,
}

impl From<&RoundReport> for RoundSummary {
    fn from(report: &RoundReport) -> Self {
        Self {
            round: report.round,
            timestamp: report.timestamp.to_rfc3339(),
            lots_opened: report.lots_opened,
            lots_won: report.lots_won,
            bids_accepted: report.bids_accepted,
            rejections: report.rejections.len(),
            gold_spent: report.gold_spent,
            points_awarded: report.points_awarded,
            pool_paid: report.pool_paid,
            pool_minted: report.pool_minted,
            pool_gold_after: report.record.pool_gold_after,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestRound {
    pub round: u64,
    pub prev_auctions: serde_json::Value,
    pub prev_pool_buys: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub type AppState = Arc<BoardState>;

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<GameStatus> {
    Json(state.status.read().await.clone())
}

/// GET /api/standings
pub async fn get_standings(State(state): State<AppState>) -> Json<Vec<AgentAccount>> {
    Json(state.standings.read().await.clone())
}

/// GET /api/rounds
pub async fn get_rounds(State(state): State<AppState>) -> Json<Vec<RoundSummary>> {
    Json(state.rounds.read().await.clone())
}

/// GET /api/rounds/latest
///
/// The last published round in the shape agents receive it.
pub async fn get_latest_round(State(state): State<AppState>) -> Result<Json<LatestRound>, StatusCode> {
    let latest = state.latest.read().await;
    let record = latest.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(LatestRound {
        round: record.round,
        prev_auctions: serde_json::to_value(&record.auctions).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
        prev_pool_buys: serde_json::to_value(&record.pool_buys).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}
