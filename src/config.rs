//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! table is optional; anything left out falls back to its `Default`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::time::Duration;

use crate::engine::bank::BankConfig;
use crate::engine::generator::AuctionConfig;
use crate::engine::house::SettlementConfig;
use crate::strategy::StrategyKind;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub settlement: SettlementConfig,
    pub bank: BankConfig,
    pub auctions: AuctionConfig,
    pub agents: Vec<AgentEntry>,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    pub seed: u64,
    pub rounds: usize,
    pub starting_gold: u64,
    pub starting_points: u64,
    pub initial_pool_gold: u64,
    /// How long an agent may think before its answer counts as empty.
    pub agent_timeout_ms: u64,
    /// Pause between rounds.
    pub round_delay_ms: u64,
    /// Where the game log is written; no log when unset.
    pub log_path: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "GAVEL-001".into(),
            seed: 42,
            rounds: 1000,
            starting_gold: 1000,
            starting_points: 0,
            initial_pool_gold: 0,
            agent_timeout_ms: 500,
            round_delay_ms: 0,
            log_path: None,
        }
    }
}

impl GameConfig {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }

    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AgentEntry {
    pub id: String,
    pub strategy: StrategyKind,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// The configured roster, or one agent per strategy when none is listed.
    pub fn roster(&self) -> Vec<AgentEntry> {
        if !self.agents.is_empty() {
            return self.agents.clone();
        }
        StrategyKind::ALL
            .iter()
            .map(|k| AgentEntry {
                id: k.as_str().to_string(),
                strategy: *k,
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.settlement.validate()?;
        self.bank.validate()?;
        self.auctions.validate()?;
        if self.game.rounds == 0 {
            bail!("game.rounds must be at least 1");
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.id.is_empty() {
                bail!("agent ids must not be empty");
            }
            if !seen.insert(agent.id.as_str()) {
                bail!("duplicate agent id: {}", agent.id);
            }
        }
        Ok(())
    }
}
