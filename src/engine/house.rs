//! Auction house — the settlement engine.
//!
//! Owns the authoritative accounts and the pool balance. Each round moves
//! through `AwaitingBids → Resolving → Published`:
//!
//! 1. `open_round` snapshots accounts and pool, opens the lots.
//! 2. `submit` validates each agent's response entry by entry. Bids are
//!    checked against a per-agent budget so nobody can win more than they
//!    hold; pool requests debit points immediately.
//! 3. `resolve` ranks every lot, charges winners and credits rewards, pays
//!    the pool out of the round-start balance, feeds winning payments into
//!    the pool, applies the bank step, and publishes the round record.
//!
//! A bad entry is rejected on its own; the round always publishes.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::engine::bank::{self, BankSchedule, LimitPolicy};
use crate::engine::rewards::{self, RewardMode};
use crate::ledger::{AuctionBook, PoolBook};
use crate::types::{
    AgentAccount, AgentId, AuctionId, BidResponse, GavelError, RawSubmission, Rejection,
    RewardDescriptor, RoundInput, RoundPhase, RoundRecord, RoundView, SubmissionReceipt,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What happens to a bid larger than the bidder's remaining gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdraftPolicy {
    /// Drop the bid.
    #[default]
    Reject,
    /// Lower the bid to whatever gold is left.
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub overdraft_policy: OverdraftPolicy,
    pub reward_mode: RewardMode,
    /// Share of every winning payment that goes into the pool.
    pub pool_feed_ratio: Decimal,
    pub limit_policy: LimitPolicy,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            overdraft_policy: OverdraftPolicy::Reject,
            reward_mode: RewardMode::Roll,
            pool_feed_ratio: Decimal::ZERO,
            limit_policy: LimitPolicy::InterestCap,
        }
    }
}

impl SettlementConfig {
    pub fn validate(&self) -> Result<(), GavelError> {
        if self.pool_feed_ratio < Decimal::ZERO || self.pool_feed_ratio > Decimal::ONE {
            return Err(GavelError::Config(format!(
                "settlement.pool_feed_ratio must be within [0, 1], got {}",
                self.pool_feed_ratio
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Round report
// ---------------------------------------------------------------------------

/// Summary of one resolved round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u64,
    pub lots_opened: usize,
    pub lots_won: usize,
    pub bids_accepted: usize,
    pub rejections: Vec<Rejection>,
    pub gold_spent: u64,
    pub points_awarded: u64,
    pub pool_fed: u64,
    pub pool_paid: u64,
    pub pool_minted: u64,
    pub income_paid: u64,
    pub interest_paid: u64,
    pub record: RoundRecord,
    pub input: RoundInput,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Auction house
// ---------------------------------------------------------------------------

pub struct AuctionHouse {
    config: SettlementConfig,
    accounts: BTreeMap<AgentId, AgentAccount>,
    bank: BankSchedule,
    /// Next bank step to apply.
    cursor: usize,
    /// Open round, or the last published one.
    round: u64,
    gold_in_pool: u64,
    phase: RoundPhase,
    book: AuctionBook,
    pool: PoolBook,
    sequence: u64,
    game_seed: u64,
    opening: Option<RoundInput>,
    rejections: Vec<Rejection>,
    bids_accepted: usize,
    previous: Option<RoundRecord>,
}

impl AuctionHouse {
    pub fn new(
        config: SettlementConfig,
        accounts: Vec<AgentAccount>,
        bank: BankSchedule,
        gold_in_pool: u64,
        game_seed: u64,
    ) -> Result<Self, GavelError> {
        config.validate()?;
        let mut by_id = BTreeMap::new();
        for account in accounts {
            if by_id.contains_key(&account.agent_id) {
                return Err(GavelError::DuplicateAgent(account.agent_id));
            }
            by_id.insert(account.agent_id.clone(), account);
        }

        Ok(Self {
            config,
            accounts: by_id,
            bank,
            cursor: 0,
            round: 0,
            gold_in_pool,
            phase: RoundPhase::Published,
            book: AuctionBook::new(),
            pool: PoolBook::new(),
            sequence: 0,
            game_seed,
            opening: None,
            rejections: Vec::new(),
            bids_accepted: 0,
            previous: None,
        })
    }

    // -- Accessors -------------------------------------------------------

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn gold_in_pool(&self) -> u64 {
        self.gold_in_pool
    }

    pub fn account(&self, agent_id: &str) -> Option<&AgentAccount> {
        self.accounts.get(agent_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AgentAccount> {
        self.accounts.values()
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.accounts.keys().cloned().collect()
    }

    /// Accounts ranked by points, then gold, then id.
    pub fn standings(&self) -> Vec<AgentAccount> {
        let mut ranked: Vec<AgentAccount> = self.accounts.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| b.gold.cmp(&a.gold))
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        ranked
    }

    /// Sum of gold held by agents (the pool excluded).
    pub fn total_agent_gold(&self) -> u64 {
        self.accounts.values().map(|a| a.gold).sum()
    }

    /// Rounds still to be played, counting an open one.
    pub fn rounds_remaining(&self) -> usize {
        self.bank.len().saturating_sub(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RoundPhase::Published && self.cursor >= self.bank.len()
    }

    pub fn previous_round(&self) -> Option<&RoundRecord> {
        self.previous.as_ref()
    }

    fn expect_phase(&self, expected: RoundPhase) -> Result<(), GavelError> {
        if self.phase != expected {
            return Err(GavelError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    // -- Round lifecycle -------------------------------------------------

    /// Open the next round with the given lots.
    pub fn open_round(&mut self, lots: BTreeMap<AuctionId, RewardDescriptor>) -> Result<u64, GavelError> {
        let seed = rewards::round_seed(self.game_seed, self.round + 1);
        self.open_round_seeded(lots, seed)
    }

    fn open_round_seeded(
        &mut self,
        lots: BTreeMap<AuctionId, RewardDescriptor>,
        reward_seed: u64,
    ) -> Result<u64, GavelError> {
        self.expect_phase(RoundPhase::Published)?;
        let step = *self
            .bank
            .step(self.cursor)
            .ok_or(GavelError::ScheduleExhausted(self.round))?;
        for lot in lots.values() {
            lot.validate()?;
        }

        self.round += 1;
        self.book.clear();
        self.pool.clear();
        self.sequence = 0;
        self.rejections.clear();
        self.bids_accepted = 0;
        for (id, lot) in &lots {
            self.book.open(id.clone(), *lot)?;
        }

        self.opening = Some(RoundInput {
            round: self.round,
            accounts: self.accounts.values().cloned().collect(),
            gold_in_pool: self.gold_in_pool,
            auctions: lots,
            bank_step: step,
            reward_seed,
            submissions: Vec::new(),
        });
        self.phase = RoundPhase::AwaitingBids;

        debug!(
            round = self.round,
            lots = self.book.len(),
            pool_gold = self.gold_in_pool,
            "Round opened"
        );
        Ok(self.round)
    }

    /// The round-start snapshot as `agent_id` sees it.
    pub fn view_for(&self, agent_id: &str) -> Result<RoundView, GavelError> {
        self.expect_phase(RoundPhase::AwaitingBids)?;
        if !self.accounts.contains_key(agent_id) {
            return Err(GavelError::UnknownAgent(agent_id.to_string()));
        }
        let opening = self.opening.as_ref().ok_or(GavelError::WrongPhase {
            expected: RoundPhase::AwaitingBids,
            actual: self.phase,
        })?;

        let (prev_auctions, prev_pool_buys) = match &self.previous {
            Some(prev) => (prev.auctions.clone(), prev.pool_buys.clone()),
            None => Default::default(),
        };

        Ok(RoundView {
            agent_id: agent_id.to_string(),
            round: self.round,
            states: opening
                .accounts
                .iter()
                .map(|a| (a.agent_id.clone(), a.snapshot()))
                .collect(),
            auctions: opening.auctions.clone(),
            prev_auctions,
            pool_gold: opening.gold_in_pool,
            prev_pool_buys,
            bank_state: self.bank.view_from(self.cursor),
        })
    }

    /// Register an agent's whole response. Bad entries are rejected
    /// individually and listed on the receipt.
    pub fn submit(&mut self, agent_id: &str, response: BidResponse) -> Result<SubmissionReceipt, GavelError> {
        self.expect_phase(RoundPhase::AwaitingBids)?;
        self.record_submission(agent_id, &response);

        let mut receipt = SubmissionReceipt::new(agent_id);
        for (auction_id, &gold) in &response.bids {
            match self.place_bid(agent_id, auction_id, gold) {
                Ok(accepted) => {
                    receipt.accepted_bids.insert(auction_id.clone(), accepted);
                }
                Err(reason) => receipt.reject(Some(auction_id), reason),
            }
        }
        match self.place_pool_buy(agent_id, response.pool) {
            Ok(Some(points)) => receipt.pool_points = Some(points),
            Ok(None) => {}
            Err(reason) => receipt.reject(None, reason),
        }

        self.rejections.extend(receipt.rejections.iter().cloned());
        Ok(receipt)
    }

    /// Register a single bid. Returns the gold actually bid.
    pub fn register_bid(&mut self, agent_id: &str, auction_id: &str, gold: i64) -> Result<u64, GavelError> {
        self.expect_phase(RoundPhase::AwaitingBids)?;
        self.record_submission(agent_id, &BidResponse::empty().with_bid(auction_id, gold));
        let result = self.place_bid(agent_id, auction_id, gold);
        if let Err(reason) = &result {
            self.rejections.push(Rejection {
                agent_id: agent_id.to_string(),
                auction_id: Some(auction_id.to_string()),
                reason: reason.clone(),
            });
        }
        result
    }

    /// Register a pool request, debiting the points now. Returns the points
    /// actually debited (the request clamped to the agent's balance).
    pub fn register_pool_buy(&mut self, agent_id: &str, points: i64) -> Result<u64, GavelError> {
        self.expect_phase(RoundPhase::AwaitingBids)?;
        self.record_submission(agent_id, &BidResponse::empty().with_pool(points));
        match self.place_pool_buy(agent_id, points) {
            Ok(debited) => Ok(debited.unwrap_or(0)),
            Err(reason) => {
                self.rejections.push(Rejection {
                    agent_id: agent_id.to_string(),
                    auction_id: None,
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    fn record_submission(&mut self, agent_id: &str, response: &BidResponse) {
        if let Some(opening) = self.opening.as_mut() {
            opening.submissions.push(RawSubmission {
                agent_id: agent_id.to_string(),
                response: response.clone(),
            });
        }
    }

    fn place_bid(&mut self, agent_id: &str, auction_id: &str, gold: i64) -> Result<u64, GavelError> {
        let account = self
            .accounts
            .get(agent_id)
            .ok_or_else(|| GavelError::UnknownAgent(agent_id.to_string()))?;
        if gold < 0 {
            return Err(GavelError::NegativeAmount(gold));
        }
        if !self.book.contains(auction_id) {
            return Err(GavelError::UnknownAuction(auction_id.to_string()));
        }

        let requested = gold as u64;
        let replacing = self.book.bid_of(auction_id, agent_id).unwrap_or(0);
        let committed = self.book.committed_by(agent_id) - replacing;
        let available = account.gold.saturating_sub(committed);

        let amount = if requested <= available {
            requested
        } else {
            match self.config.overdraft_policy {
                OverdraftPolicy::Clamp if available > 0 => {
                    debug!(
                        agent_id,
                        auction_id,
                        requested,
                        clamped = available,
                        "Bid clamped to remaining gold"
                    );
                    available
                }
                _ => {
                    return Err(GavelError::InsufficientGold {
                        needed: requested,
                        available,
                    })
                }
            }
        };

        let sequence = self.sequence;
        self.sequence += 1;
        if self.book.place(auction_id, agent_id, amount, sequence)?.is_none() {
            self.bids_accepted += 1;
        }
        Ok(amount)
    }

    fn place_pool_buy(&mut self, agent_id: &str, points: i64) -> Result<Option<u64>, GavelError> {
        if points == 0 {
            return Ok(None);
        }
        if points < 0 {
            return Err(GavelError::NegativeAmount(points));
        }
        if self.pool.contains(agent_id) {
            return Err(GavelError::DuplicatePoolBuy(agent_id.to_string()));
        }
        let account = self
            .accounts
            .get_mut(agent_id)
            .ok_or_else(|| GavelError::UnknownAgent(agent_id.to_string()))?;

        let debit = (points as u64).min(account.points);
        if debit < points as u64 {
            debug!(
                agent_id,
                requested = points,
                debited = debit,
                "Pool request clamped to available points"
            );
        }
        account.points -= debit;
        self.pool.register(agent_id, debit)?;
        Ok(Some(debit))
    }

    /// Resolve the open round and publish its record.
    pub fn resolve(&mut self) -> Result<RoundReport, GavelError> {
        self.expect_phase(RoundPhase::AwaitingBids)?;
        self.phase = RoundPhase::Resolving;

        let input = self.opening.take().ok_or(GavelError::WrongPhase {
            expected: RoundPhase::AwaitingBids,
            actual: RoundPhase::Resolving,
        })?;
        let pool_snapshot = input.gold_in_pool;

        // 1. Lots
        let mut rewards = self.config.reward_mode.source(input.reward_seed);
        let mut resolved = BTreeMap::new();
        let mut gold_spent = 0u64;
        let mut points_awarded = 0u64;
        let mut pool_fed = 0u64;
        let mut lots_won = 0usize;

        for outcome in self.book.resolve_all() {
            let realized = match outcome.winner() {
                Some(winner) => {
                    let reward = rewards.realize(&outcome.reward).unwrap_or_else(|e| {
                        warn!(auction_id = %outcome.auction_id, error = %e, "Reward realization failed");
                        0
                    });
                    if let Some(account) = self.accounts.get_mut(&winner.agent_id) {
                        account.gold = account.gold.saturating_sub(winner.gold);
                        let before = account.points;
                        account.points = account.points.saturating_add_signed(reward);
                        points_awarded += account.points.saturating_sub(before);
                    }
                    gold_spent += winner.gold;
                    pool_fed += feed_share(winner.gold, self.config.pool_feed_ratio);
                    lots_won += 1;
                    debug!(
                        auction_id = %outcome.auction_id,
                        winner = %winner.agent_id,
                        price = winner.gold,
                        reward,
                        "Lot settled"
                    );
                    Some(reward)
                }
                None => None,
            };
            resolved.insert(outcome.auction_id.clone(), outcome.to_record(realized));
        }

        // 2. Pool, paid from the round-start balance
        let distribution = self.pool.distribute(pool_snapshot);
        for (agent_id, gold) in &distribution.payouts {
            if let Some(account) = self.accounts.get_mut(agent_id) {
                account.gold += gold;
            }
        }
        self.gold_in_pool = distribution.gold_after() + pool_fed;

        // 3. Bank
        let mut income_paid = 0u64;
        let mut interest_paid = 0u64;
        for account in self.accounts.values_mut() {
            let credit = bank::apply_step(account, &input.bank_step, self.config.limit_policy);
            income_paid += credit.income;
            interest_paid += credit.interest;
        }
        self.cursor += 1;

        // 4. Publish
        let record = RoundRecord {
            round: input.round,
            auctions: resolved,
            pool_buys: self.pool.requests().clone(),
            pool_payouts: distribution.payouts.clone(),
            pool_gold_before: pool_snapshot,
            pool_gold_after: self.gold_in_pool,
        };
        self.previous = Some(record.clone());
        self.phase = RoundPhase::Published;

        let report = RoundReport {
            round: input.round,
            lots_opened: input.auctions.len(),
            lots_won,
            bids_accepted: self.bids_accepted,
            rejections: std::mem::take(&mut self.rejections),
            gold_spent,
            points_awarded,
            pool_fed,
            pool_paid: distribution.total_paid(),
            pool_minted: distribution.minted,
            income_paid,
            interest_paid,
            record,
            input,
            timestamp: Utc::now(),
        };

        info!(
            round = report.round,
            lots_won = report.lots_won,
            bids = report.bids_accepted,
            rejected = report.rejections.len(),
            spent = report.gold_spent,
            pool_paid = report.pool_paid,
            pool_gold = self.gold_in_pool,
            "Round published"
        );

        Ok(report)
    }
}

fn feed_share(price: u64, ratio: Decimal) -> u64 {
    (Decimal::from(price) * ratio).floor().to_u64().unwrap_or(0)
}

/// Resolve a recorded round again from its input alone.
pub fn replay(input: &RoundInput, config: &SettlementConfig) -> Result<RoundRecord, GavelError> {
    let mut house = AuctionHouse::new(
        config.clone(),
        input.accounts.clone(),
        BankSchedule::new(vec![input.bank_step]),
        input.gold_in_pool,
        0,
    )?;
    house.round = input.round.saturating_sub(1);
    house.open_round_seeded(input.auctions.clone(), input.reward_seed)?;
    for submission in &input.submissions {
        house.submit(&submission.agent_id, submission.response.clone())?;
    }
    Ok(house.resolve()?.record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BankStep;
    use rust_decimal_macros::dec;

    fn make_schedule(rounds: usize) -> BankSchedule {
        BankSchedule::new(vec![
            BankStep {
                income: 0,
                interest: dec!(1.00),
                limit: 0,
            };
            rounds
        ])
    }

    fn make_house(accounts: &[(&str, u64, u64)], pool: u64, config: SettlementConfig) -> AuctionHouse {
        AuctionHouse::new(
            config,
            accounts
                .iter()
                .map(|(id, g, p)| AgentAccount::new(*id, *g, *p))
                .collect(),
            make_schedule(5),
            pool,
            1,
        )
        .unwrap()
    }

    fn expected_rewards() -> SettlementConfig {
        SettlementConfig {
            reward_mode: RewardMode::Expected,
            ..SettlementConfig::default()
        }
    }

    fn one_lot(id: &str, die: u32, num: u32, bonus: i64) -> BTreeMap<AuctionId, RewardDescriptor> {
        BTreeMap::from([(id.to_string(), RewardDescriptor::new(die, num, bonus))])
    }

    #[test]
    fn test_winner_pays_loser_untouched() {
        let mut house = make_house(&[("A", 500, 0), ("B", 500, 0)], 0, expected_rewards());
        house.open_round(one_lot("x", 20, 1, 0)).unwrap();
        house.submit("A", BidResponse::empty().with_bid("x", 100)).unwrap();
        house.submit("B", BidResponse::empty().with_bid("x", 80)).unwrap();
        let report = house.resolve().unwrap();

        assert_eq!(house.account("A").unwrap().gold, 400);
        assert_eq!(house.account("A").unwrap().points, 10);
        assert_eq!(house.account("B").unwrap().gold, 500);
        assert_eq!(house.account("B").unwrap().points, 0);
        let lot = &report.record.auctions["x"];
        assert_eq!(lot.winner().unwrap().a_id, "A");
        assert_eq!(lot.winner().unwrap().gold, 100);
        assert_eq!(lot.reward, Some(10));
    }

    #[test]
    fn test_lot_without_bids_changes_nothing() {
        let mut house = make_house(&[("A", 500, 7)], 0, expected_rewards());
        house.open_round(one_lot("x", 6, 2, 0)).unwrap();
        let report = house.resolve().unwrap();
        assert_eq!(report.lots_won, 0);
        assert!(report.record.auctions["x"].bids.is_empty());
        assert!(report.record.auctions["x"].reward.is_none());
        assert_eq!(house.account("A").unwrap().gold, 500);
        assert_eq!(house.account("A").unwrap().points, 7);
    }

    #[test]
    fn test_pool_request_debits_on_register() {
        let mut house = make_house(&[("A", 0, 40)], 1000, expected_rewards());
        house.open_round(BTreeMap::new()).unwrap();
        let debited = house.register_pool_buy("A", 1000).unwrap();
        assert_eq!(debited, 40);
        assert_eq!(house.account("A").unwrap().points, 0);
        assert_eq!(house.account("A").unwrap().gold, 0);

        house.resolve().unwrap();
        assert_eq!(house.account("A").unwrap().gold, 1000);
        assert_eq!(house.gold_in_pool(), 0);
    }

    #[test]
    fn test_second_pool_request_cannot_reuse_points() {
        let mut house = make_house(&[("A", 0, 30)], 100, expected_rewards());
        house.open_round(BTreeMap::new()).unwrap();
        assert_eq!(house.register_pool_buy("A", 20).unwrap(), 20);
        assert!(matches!(
            house.register_pool_buy("A", 20),
            Err(GavelError::DuplicatePoolBuy(_))
        ));
        assert_eq!(house.account("A").unwrap().points, 10);
    }

    #[test]
    fn test_overdraft_reject_policy() {
        let mut house = make_house(&[("A", 100, 0)], 0, expected_rewards());
        house
            .open_round(BTreeMap::from([
                ("a".to_string(), RewardDescriptor::new(6, 1, 0)),
                ("b".to_string(), RewardDescriptor::new(6, 1, 0)),
            ]))
            .unwrap();
        let receipt = house
            .submit("A", BidResponse::empty().with_bid("a", 70).with_bid("b", 70))
            .unwrap();
        assert_eq!(receipt.accepted_bids.get("a"), Some(&70));
        assert!(!receipt.accepted_bids.contains_key("b"));
        assert_eq!(
            receipt.rejections[0].reason,
            GavelError::InsufficientGold { needed: 70, available: 30 }
        );
        house.resolve().unwrap();
        assert_eq!(house.account("A").unwrap().gold, 30);
    }

    #[test]
    fn test_overdraft_clamp_policy() {
        let config = SettlementConfig {
            overdraft_policy: OverdraftPolicy::Clamp,
            ..expected_rewards()
        };
        let mut house = make_house(&[("A", 100, 0)], 0, config);
        house
            .open_round(BTreeMap::from([
                ("a".to_string(), RewardDescriptor::new(6, 1, 0)),
                ("b".to_string(), RewardDescriptor::new(6, 1, 0)),
                ("c".to_string(), RewardDescriptor::new(6, 1, 0)),
            ]))
            .unwrap();
        let receipt = house
            .submit(
                "A",
                BidResponse::empty().with_bid("a", 70).with_bid("b", 70).with_bid("c", 5),
            )
            .unwrap();
        assert_eq!(receipt.accepted_bids["a"], 70);
        assert_eq!(receipt.accepted_bids["b"], 30);
        assert!(!receipt.accepted_bids.contains_key("c"));
        assert_eq!(receipt.rejections.len(), 1);

        house.resolve().unwrap();
        assert_eq!(house.account("A").unwrap().gold, 0);
    }

    #[test]
    fn test_bad_entries_rejected_individually() {
        let mut house = make_house(&[("A", 100, 10)], 0, expected_rewards());
        house.open_round(one_lot("x", 8, 1, 0)).unwrap();
        let receipt = house
            .submit(
                "A",
                BidResponse::empty()
                    .with_bid("ghost", 10)
                    .with_bid("x", 25)
                    .with_pool(-4),
            )
            .unwrap();
        assert_eq!(receipt.accepted_bids["x"], 25);
        assert_eq!(receipt.rejections.len(), 2);
        assert!(receipt
            .rejections
            .iter()
            .any(|r| r.reason == GavelError::UnknownAuction("ghost".into())));
        assert!(receipt
            .rejections
            .iter()
            .any(|r| r.reason == GavelError::NegativeAmount(-4)));

        let unknown = house
            .submit("nobody", BidResponse::empty().with_bid("x", 5).with_pool(3))
            .unwrap();
        assert!(unknown.accepted_bids.is_empty());
        assert!(unknown
            .rejections
            .iter()
            .all(|r| r.reason == GavelError::UnknownAgent("nobody".into())));

        let report = house.resolve().unwrap();
        assert_eq!(report.rejections.len(), 4);
        assert_eq!(report.record.auctions["x"].winner().unwrap().a_id, "A");
    }

    #[test]
    fn test_rebid_within_budget_replaces() {
        let mut house = make_house(&[("A", 100, 0)], 0, expected_rewards());
        house.open_round(one_lot("x", 8, 1, 0)).unwrap();
        house.register_bid("A", "x", 90).unwrap();
        // Replacing 90 with 100 only needs the 100 we hold.
        assert_eq!(house.register_bid("A", "x", 100).unwrap(), 100);
        let report = house.resolve().unwrap();
        assert_eq!(report.record.auctions["x"].bids.len(), 1);
        assert_eq!(report.bids_accepted, 1);
        assert_eq!(house.account("A").unwrap().gold, 0);
    }

    #[test]
    fn test_rounds_remaining_matches_agent_view() {
        let mut house = make_house(&[("A", 100, 0)], 0, expected_rewards());
        assert_eq!(house.rounds_remaining(), 5);
        house.open_round(BTreeMap::new()).unwrap();
        let view = house.view_for("A").unwrap();
        assert_eq!(house.rounds_remaining(), 5);
        assert_eq!(house.rounds_remaining(), view.bank_state.rounds_remaining());
        house.resolve().unwrap();
        assert_eq!(house.rounds_remaining(), 4);
    }

    #[test]
    fn test_oversized_lot_refused_at_open() {
        let mut house = make_house(&[("A", 100, 0)], 0, expected_rewards());
        assert!(matches!(
            house.open_round(one_lot("x", 6, u32::MAX, 0)),
            Err(GavelError::InvalidDiceCount(u32::MAX))
        ));
        assert_eq!(house.phase(), RoundPhase::Published);
    }

    #[test]
    fn test_views_share_round_start_snapshot() {
        let mut house = make_house(&[("A", 100, 50), ("B", 100, 50)], 10, expected_rewards());
        house.open_round(one_lot("x", 8, 1, 0)).unwrap();
        let before = house.view_for("B").unwrap();
        house.register_pool_buy("A", 30).unwrap();
        let after = house.view_for("B").unwrap();
        assert_eq!(before.states, after.states);
        assert_eq!(after.states["A"].points, 50);
        assert_eq!(after.bank_state.rounds_remaining(), 5);
    }

    #[test]
    fn test_previous_round_published_to_views() {
        let mut house = make_house(&[("A", 100, 50), ("B", 100, 0)], 10, expected_rewards());
        house.open_round(one_lot("x", 8, 1, 0)).unwrap();
        house.submit("B", BidResponse::empty().with_bid("x", 5)).unwrap();
        house.submit("A", BidResponse::empty().with_pool(5)).unwrap();
        house.resolve().unwrap();

        house.open_round(BTreeMap::new()).unwrap();
        let view = house.view_for("A").unwrap();
        assert_eq!(view.prev_auctions["x"].bids[0].a_id, "B");
        assert_eq!(view.prev_pool_buys["A"], 5);
        assert_eq!(view.round, 2);
    }

    #[test]
    fn test_phase_guards() {
        let mut house = make_house(&[("A", 100, 0)], 0, expected_rewards());
        assert!(matches!(house.resolve(), Err(GavelError::WrongPhase { .. })));
        assert!(matches!(
            house.submit("A", BidResponse::empty()),
            Err(GavelError::WrongPhase { .. })
        ));
        house.open_round(BTreeMap::new()).unwrap();
        assert!(matches!(
            house.open_round(BTreeMap::new()),
            Err(GavelError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_schedule_exhaustion_ends_game() {
        let mut house = AuctionHouse::new(
            expected_rewards(),
            vec![AgentAccount::new("A", 0, 0)],
            make_schedule(2),
            0,
            0,
        )
        .unwrap();
        for _ in 0..2 {
            house.open_round(BTreeMap::new()).unwrap();
            house.resolve().unwrap();
        }
        assert!(house.is_finished());
        assert_eq!(house.rounds_remaining(), 0);
        assert!(matches!(
            house.open_round(BTreeMap::new()),
            Err(GavelError::ScheduleExhausted(2))
        ));
    }

    #[test]
    fn test_pool_feed_lands_after_distribution() {
        let config = SettlementConfig {
            pool_feed_ratio: dec!(0.5),
            ..expected_rewards()
        };
        let mut house = make_house(&[("A", 1000, 0), ("B", 0, 10)], 100, config);
        house.open_round(one_lot("x", 4, 1, 0)).unwrap();
        house.submit("A", BidResponse::empty().with_bid("x", 301)).unwrap();
        house.submit("B", BidResponse::empty().with_pool(10)).unwrap();
        let report = house.resolve().unwrap();
        // B gets the whole round-start pool, the feed arrives afterwards.
        assert_eq!(house.account("B").unwrap().gold, 100);
        assert_eq!(report.pool_fed, 150);
        assert_eq!(house.gold_in_pool(), 150);
    }

    #[test]
    fn test_duplicate_agents_rejected() {
        let result = AuctionHouse::new(
            SettlementConfig::default(),
            vec![AgentAccount::new("A", 0, 0), AgentAccount::new("A", 1, 1)],
            make_schedule(1),
            0,
            0,
        );
        assert!(matches!(result, Err(GavelError::DuplicateAgent(_))));
    }

    #[test]
    fn test_bad_feed_ratio_rejected() {
        let config = SettlementConfig {
            pool_feed_ratio: dec!(1.5),
            ..SettlementConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_replay_reproduces_record() {
        let mut house = make_house(&[("A", 300, 20), ("B", 300, 20), ("C", 300, 0)], 500, SettlementConfig::default());
        house
            .open_round(BTreeMap::from([
                ("a".to_string(), RewardDescriptor::new(20, 2, 1)),
                ("b".to_string(), RewardDescriptor::new(6, 3, 0)),
            ]))
            .unwrap();
        house.submit("C", BidResponse::empty().with_bid("a", 50).with_bid("b", 50)).unwrap();
        house.submit("A", BidResponse::empty().with_bid("a", 50).with_pool(15)).unwrap();
        house.submit("B", BidResponse::empty().with_bid("b", 400).with_pool(99)).unwrap();
        let report = house.resolve().unwrap();

        let again = replay(&report.input, house.config()).unwrap();
        assert_eq!(again, report.record);
        let third = replay(&report.input, house.config()).unwrap();
        assert_eq!(third, again);
    }
}
