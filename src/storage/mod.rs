//! Persistence layer.
//!
//! A game is saved as a single pretty-printed JSON log: the settlement
//! policy it ran under plus, for every round, the input the auction house
//! opened it with and the record it published. That is enough to resolve
//! every round again and check the outcome matches.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::house::{self, RoundReport, SettlementConfig};
use crate::types::{RoundInput, RoundRecord};

/// Default log file path.
pub const DEFAULT_LOG_FILE: &str = "gavel_game.json";

// ---------------------------------------------------------------------------
// Game log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedRound {
    pub input: RoundInput,
    pub record: RoundRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLog {
    pub game_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub seed: u64,
    pub settlement: SettlementConfig,
    pub rounds: Vec<LoggedRound>,
}

impl GameLog {
    pub fn new(seed: u64, settlement: SettlementConfig) -> Self {
        Self {
            game_id: Uuid::new_v4(),
            started_at: Utc::now(),
            seed,
            settlement,
            rounds: Vec::new(),
        }
    }

    pub fn push(&mut self, report: &RoundReport) {
        self.rounds.push(LoggedRound {
            input: report.input.clone(),
            record: report.record.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Resolve every logged round again. Returns the rounds whose replay
    /// failed or differed from the record.
    pub fn verify(&self) -> Vec<u64> {
        let mut mismatched = Vec::new();
        for logged in &self.rounds {
            match house::replay(&logged.input, &self.settlement) {
                Ok(record) if record == logged.record => {}
                Ok(_) => {
                    warn!(round = logged.input.round, "Replay differs from record");
                    mismatched.push(logged.input.round);
                }
                Err(e) => {
                    warn!(round = logged.input.round, error = %e, "Replay failed");
                    mismatched.push(logged.input.round);
                }
            }
        }
        mismatched
    }
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

/// Save a game log as JSON.
pub fn save_log(log: &GameLog, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_LOG_FILE);
    let json = serde_json::to_string_pretty(log).context("Failed to serialise game log")?;

    std::fs::write(path, &json).context(format!("Failed to write game log to {path}"))?;

    debug!(path, game_id = %log.game_id, rounds = log.len(), "Game log saved");
    Ok(())
}

/// Load a game log. Returns None if the file doesn't exist.
pub fn load_log(path: Option<&str>) -> Result<Option<GameLog>> {
    let path = path.unwrap_or(DEFAULT_LOG_FILE);

    if !Path::new(path).exists() {
        info!(path, "No game log found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read game log from {path}"))?;

    let log: GameLog =
        serde_json::from_str(&json).context(format!("Failed to parse game log from {path}"))?;

    info!(
        path,
        game_id = %log.game_id,
        rounds = log.len(),
        "Game log loaded"
    );

    Ok(Some(log))
}

/// Delete the log file.
pub fn delete_log(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_LOG_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete game log {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
