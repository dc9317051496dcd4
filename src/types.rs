//! Shared types for the GAVEL arena.
//!
//! These types form the data model used across all modules: accounts,
//! lots, bids, pool requests, bank schedule views, and the per-round
//! records agents observe. Field names follow the JSON wire shape that
//! agents exchange with the arena so the records serialize verbatim.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::dice;

pub type AgentId = String;
pub type AuctionId = String;

// ---------------------------------------------------------------------------
// Reward descriptor
// ---------------------------------------------------------------------------

/// The reward a lot pays its winner: `num`d`die` + `bonus` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDescriptor {
    pub die: u32,
    pub num: u32,
    pub bonus: i64,
}

impl RewardDescriptor {
    pub fn new(die: u32, num: u32, bonus: i64) -> Self {
        Self { die, num, bonus }
    }

    /// Expected value of the lot. Fails on an illegal die or dice count.
    pub fn expected_value(&self) -> Result<f64, GavelError> {
        dice::expected_value(self.die, self.num, self.bonus)
    }

    /// Validate without computing anything.
    pub fn validate(&self) -> Result<(), GavelError> {
        self.expected_value().map(|_| ())
    }
}

impl fmt::Display for RewardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bonus >= 0 {
            write!(f, "{}d{}+{}", self.num, self.die, self.bonus)
        } else {
            write!(f, "{}d{}{}", self.num, self.die, self.bonus)
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Authoritative balance of one agent. Only the auction house mutates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAccount {
    pub agent_id: AgentId,
    pub gold: u64,
    pub points: u64,
}

impl AgentAccount {
    pub fn new(agent_id: impl Into<AgentId>, gold: u64, points: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            gold,
            points,
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            gold: self.gold,
            points: self.points,
        }
    }
}

impl fmt::Display for AgentAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} gold={} points={}",
            self.agent_id, self.gold, self.points
        )
    }
}

/// What every agent sees of every other agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub gold: u64,
    pub points: u64,
}

// ---------------------------------------------------------------------------
// Resolved auctions (previous-round view)
// ---------------------------------------------------------------------------

/// One ranked bid on a resolved lot, in wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub a_id: AgentId,
    pub gold: u64,
}

/// A lot after resolution. `bids[0]` is the winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAuction {
    #[serde(flatten)]
    pub lot: RewardDescriptor,
    /// Points credited to the winner; absent when nobody bid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,
    pub bids: Vec<BidRecord>,
}

impl ResolvedAuction {
    pub fn winner(&self) -> Option<&BidRecord> {
        self.bids.first()
    }
}

// ---------------------------------------------------------------------------
// Bank schedule
// ---------------------------------------------------------------------------

/// One round's worth of bank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStep {
    pub income: u64,
    /// Interest multiplier, e.g. 1.05 for 5%.
    pub interest: Decimal,
    pub limit: u64,
}

/// Forward-looking bank schedule as agents observe it. Index 0 is the
/// step applied at the end of the current round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankState {
    pub gold_income_per_round: Vec<u64>,
    pub bank_interest_per_round: Vec<Decimal>,
    pub bank_limit_per_round: Vec<u64>,
}

impl BankState {
    /// Rounds remaining, the current one included.
    pub fn rounds_remaining(&self) -> usize {
        self.gold_income_per_round.len()
    }

    pub fn next_step(&self) -> Option<BankStep> {
        Some(BankStep {
            income: *self.gold_income_per_round.first()?,
            interest: *self.bank_interest_per_round.first()?,
            limit: *self.bank_limit_per_round.first()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Agent-facing round view and response
// ---------------------------------------------------------------------------

/// Everything an agent is given to make one round's decision. Every agent
/// in a round receives the same snapshot apart from `agent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub agent_id: AgentId,
    pub round: u64,
    pub states: BTreeMap<AgentId, AgentSnapshot>,
    pub auctions: BTreeMap<AuctionId, RewardDescriptor>,
    pub prev_auctions: BTreeMap<AuctionId, ResolvedAuction>,
    pub pool_gold: u64,
    pub prev_pool_buys: BTreeMap<AgentId, u64>,
    pub bank_state: BankState,
}

impl RoundView {
    /// The caller's own balance; zero if the arena does not know it.
    pub fn me(&self) -> AgentSnapshot {
        self.states
            .get(&self.agent_id)
            .copied()
            .unwrap_or(AgentSnapshot { gold: 0, points: 0 })
    }

    /// Snapshots of every agent except the caller.
    pub fn others(&self) -> impl Iterator<Item = (&AgentId, &AgentSnapshot)> {
        self.states.iter().filter(move |(id, _)| **id != self.agent_id)
    }
}

/// An agent's answer for one round: gold per lot and points offered to the pool.
///
/// Amounts are signed so malformed submissions can be detected and rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidResponse {
    #[serde(default)]
    pub bids: BTreeMap<AuctionId, i64>,
    #[serde(default)]
    pub pool: i64,
}

impl BidResponse {
    /// No bids, no pool request. Also what a late agent is treated as.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_bid(mut self, auction_id: impl Into<AuctionId>, gold: i64) -> Self {
        self.bids.insert(auction_id.into(), gold);
        self
    }

    pub fn with_pool(mut self, points: i64) -> Self {
        self.pool = points;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.pool == 0
    }
}

// ---------------------------------------------------------------------------
// Round lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    AwaitingBids,
    Resolving,
    Published,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::AwaitingBids => write!(f, "awaiting-bids"),
            RoundPhase::Resolving => write!(f, "resolving"),
            RoundPhase::Published => write!(f, "published"),
        }
    }
}

/// The resolved outcome of a round, exposed verbatim as next round's
/// `prev_auctions` / `prev_pool_buys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u64,
    pub auctions: BTreeMap<AuctionId, ResolvedAuction>,
    /// Points each agent put into the pool (after clamping).
    pub pool_buys: BTreeMap<AgentId, u64>,
    /// Gold each pool seller received.
    pub pool_payouts: BTreeMap<AgentId, u64>,
    pub pool_gold_before: u64,
    pub pool_gold_after: u64,
}

/// One submission exactly as the arena received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    pub agent_id: AgentId,
    pub response: BidResponse,
}

/// Everything needed to re-resolve a round from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundInput {
    pub round: u64,
    pub accounts: Vec<AgentAccount>,
    pub gold_in_pool: u64,
    pub auctions: BTreeMap<AuctionId, RewardDescriptor>,
    pub bank_step: BankStep,
    pub reward_seed: u64,
    pub submissions: Vec<RawSubmission>,
}

// ---------------------------------------------------------------------------
// Submission outcome
// ---------------------------------------------------------------------------

/// A single rejected entry. The rest of the submission still counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub agent_id: AgentId,
    pub auction_id: Option<AuctionId>,
    pub reason: GavelError,
}

/// What the arena made of one agent's response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub agent_id: AgentId,
    /// Bids recorded, after any clamping.
    pub accepted_bids: BTreeMap<AuctionId, u64>,
    /// Points actually debited for the pool, if a request was registered.
    pub pool_points: Option<u64>,
    pub rejections: Vec<Rejection>,
}

impl SubmissionReceipt {
    pub fn new(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn reject(&mut self, auction_id: Option<&str>, reason: GavelError) {
        self.rejections.push(Rejection {
            agent_id: self.agent_id.clone(),
            auction_id: auction_id.map(str::to_string),
            reason,
        });
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GAVEL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GavelError {
    #[error("Invalid die: d{0} is not a standard face")]
    InvalidDie(u32),

    #[error("Invalid dice count: {0} (need at least one)")]
    InvalidDiceCount(u32),

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Unknown auction: {0}")]
    UnknownAuction(AuctionId),

    #[error("Negative amount: {0}")]
    NegativeAmount(i64),

    #[error("Insufficient gold: need {needed}, have {available}")]
    InsufficientGold { needed: u64, available: u64 },

    #[error("Duplicate pool request from {0}")]
    DuplicatePoolBuy(AgentId),

    #[error("Duplicate auction id: {0}")]
    DuplicateAuction(AuctionId),

    #[error("Duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    #[error("Round is {actual}, expected {expected}")]
    WrongPhase {
        expected: RoundPhase,
        actual: RoundPhase,
    },

    #[error("Bank schedule exhausted after {0} rounds")]
    ScheduleExhausted(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
