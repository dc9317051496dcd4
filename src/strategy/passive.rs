//! Never bids. Logs what it sees each round.

use tracing::debug;

use super::BiddingStrategy;
use crate::types::{BidResponse, RoundView};

#[derive(Debug, Default)]
pub struct Passive;

impl Passive {
    pub fn new() -> Self {
        Self
    }
}

impl BiddingStrategy for Passive {
    fn name(&self) -> &str {
        "passive"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        let me = view.me();
        let bank = &view.bank_state;
        let others = view.others().count().max(1) as f64;
        let mean_gold = view.others().map(|(_, s)| s.gold as f64).sum::<f64>() / others;
        let mean_points = view.others().map(|(_, s)| s.points as f64).sum::<f64>() / others;

        debug!(
            agent_id = %view.agent_id,
            round = view.round,
            gold = me.gold,
            points = me.points,
            pool_gold = view.pool_gold,
            lots = view.auctions.len(),
            rounds_left = bank.rounds_remaining(),
            future_income = bank.gold_income_per_round.iter().sum::<u64>(),
            rival_gold = format!("{mean_gold:.1}"),
            rival_points = format!("{mean_points:.1}"),
            "Observed round"
        );

        BidResponse::empty()
    }
}
