//! Game runner.
//!
//! Drives the auction house round by round: open the generated lots, ask
//! every agent for its response concurrently, register the answers in
//! agent-id order, resolve, then publish. An agent that errors or misses
//! the timeout is treated as having sent nothing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::dashboard::AppState;
use crate::engine::bank::BankSchedule;
use crate::engine::generator::AuctionGenerator;
use crate::engine::house::{AuctionHouse, RoundReport};
use crate::storage::GameLog;
use crate::strategy::{self, BiddingStrategy};
use crate::types::{AgentAccount, AgentId, BidResponse, RoundView};

// ---------------------------------------------------------------------------
// Agent endpoints
// ---------------------------------------------------------------------------

/// Anything that can answer a round.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentEndpoint: Send + Sync {
    fn agent_id(&self) -> AgentId;

    async fn request_bids(&self, view: RoundView) -> Result<BidResponse>;
}

/// An in-process agent backed by a strategy object.
pub struct LocalAgent {
    agent_id: AgentId,
    strategy: Mutex<Box<dyn BiddingStrategy>>,
}

impl LocalAgent {
    pub fn new(agent_id: impl Into<AgentId>, strategy: Box<dyn BiddingStrategy>) -> Self {
        Self {
            agent_id: agent_id.into(),
            strategy: Mutex::new(strategy),
        }
    }
}

#[async_trait]
impl AgentEndpoint for LocalAgent {
    fn agent_id(&self) -> AgentId {
        self.agent_id.clone()
    }

    async fn request_bids(&self, view: RoundView) -> Result<BidResponse> {
        let mut strategy = self.strategy.lock().await;
        Ok(strategy.make_bid(&view))
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct GameRunner {
    house: AuctionHouse,
    generator: AuctionGenerator,
    agents: Vec<Arc<dyn AgentEndpoint>>,
    agent_timeout: Duration,
    round_delay: Duration,
    log: GameLog,
    board: Option<AppState>,
}

impl GameRunner {
    pub fn new(
        house: AuctionHouse,
        generator: AuctionGenerator,
        mut agents: Vec<Arc<dyn AgentEndpoint>>,
        agent_timeout: Duration,
        log: GameLog,
    ) -> Self {
        agents.sort_by_key(|a| a.agent_id());
        Self {
            house,
            generator,
            agents,
            agent_timeout,
            round_delay: Duration::ZERO,
            log,
            board: None,
        }
    }

    /// Build a whole game from configuration: bank schedule, lot generator,
    /// and one local agent per roster entry.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let seed = cfg.game.seed;

        let mut bank_rng = StdRng::seed_from_u64(seed);
        let schedule = BankSchedule::generate(cfg.game.rounds, &cfg.bank, &mut bank_rng)
            .context("Failed to generate bank schedule")?;
        let generator = AuctionGenerator::new(cfg.auctions.clone(), seed.wrapping_add(1))
            .context("Invalid auction generator config")?;

        let roster = cfg.roster();
        let accounts = roster
            .iter()
            .map(|a| AgentAccount::new(a.id.clone(), cfg.game.starting_gold, cfg.game.starting_points))
            .collect();
        let agents = roster
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let strategy = strategy::build(a.strategy, seed.wrapping_add(100 + i as u64));
                Arc::new(LocalAgent::new(a.id.clone(), strategy)) as Arc<dyn AgentEndpoint>
            })
            .collect();

        let house = AuctionHouse::new(
            cfg.settlement.clone(),
            accounts,
            schedule,
            cfg.game.initial_pool_gold,
            seed,
        )
        .context("Failed to set up auction house")?;

        let log = GameLog::new(seed, cfg.settlement.clone());
        let mut runner = Self::new(house, generator, agents, cfg.game.agent_timeout(), log);
        runner.round_delay = cfg.game.round_delay();
        Ok(runner)
    }

    pub fn with_board(mut self, board: AppState) -> Self {
        self.board = Some(board);
        self
    }

    pub fn house(&self) -> &AuctionHouse {
        &self.house
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn into_log(self) -> GameLog {
        self.log
    }

    /// Play one round end to end.
    pub async fn run_round(&mut self) -> Result<RoundReport> {
        let round = self.house.round() + 1;
        let lots = self.generator.lots_for_round(round);
        self.house.open_round(lots)?;

        let limit = self.agent_timeout;
        let queries: Vec<_> = self
            .agents
            .iter()
            .map(|agent| {
                let agent = Arc::clone(agent);
                let view = self.house.view_for(&agent.agent_id());
                async move {
                    let agent_id = agent.agent_id();
                    let response = match view {
                        Ok(view) => ask(agent.as_ref(), view, limit).await,
                        Err(e) => {
                            warn!(agent_id = %agent_id, error = %e, "No view for agent");
                            BidResponse::empty()
                        }
                    };
                    (agent_id, response)
                }
            })
            .collect();

        let mut responses = join_all(queries).await;
        responses.sort_by(|a, b| a.0.cmp(&b.0));

        for (agent_id, response) in responses {
            let receipt = self.house.submit(&agent_id, response)?;
            for rejection in &receipt.rejections {
                debug!(
                    round,
                    agent_id = %rejection.agent_id,
                    auction_id = ?rejection.auction_id,
                    reason = %rejection.reason,
                    "Entry rejected"
                );
            }
        }

        let report = self.house.resolve()?;
        self.log.push(&report);
        if let Some(board) = &self.board {
            board.publish(&self.house, &report).await;
        }
        Ok(report)
    }

    /// Play until the bank schedule runs out or `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.round_delay.max(Duration::from_millis(1)));
        tokio::pin!(shutdown);

        info!(
            agents = self.agents.len(),
            rounds = self.house.rounds_remaining(),
            timeout_ms = self.agent_timeout.as_millis() as u64,
            "Entering game loop. Press Ctrl+C to stop."
        );

        while !self.house.is_finished() {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_round().await {
                        Ok(report) => log_round_report(&report),
                        Err(e) => {
                            error!(error = %e, "Round failed; stopping game");
                            return Err(e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Query one agent, mapping errors and timeouts to an empty response.
async fn ask(agent: &dyn AgentEndpoint, view: RoundView, limit: Duration) -> BidResponse {
    let agent_id = view.agent_id.clone();
    match tokio::time::timeout(limit, agent.request_bids(view)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(agent_id = %agent_id, error = %e, "Agent failed; treating as empty response");
            BidResponse::empty()
        }
        Err(_) => {
            warn!(
                agent_id = %agent_id,
                timeout_ms = limit.as_millis() as u64,
                "Agent timed out; treating as empty response"
            );
            BidResponse::empty()
        }
    }
}

fn log_round_report(report: &RoundReport) {
    info!(
        round = report.round,
        won = format!("{}/{}", report.lots_won, report.lots_opened),
        bids = report.bids_accepted,
        rejected = report.rejections.len(),
        spent = report.gold_spent,
        points = report.points_awarded,
        pool_paid = report.pool_paid,
        income = report.income_paid,
        interest = report.interest_paid,
        "Round complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
