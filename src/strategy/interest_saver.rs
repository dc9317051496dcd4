//! Hoards gold while the bank pays well, spends when it doesn't.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::*;

use super::{lot_value, BiddingStrategy};
use crate::types::{BidResponse, RoundView};

/// Assumed gold value of one point.
const POINT_VALUE: f64 = 15.0;

pub struct InterestSaver {
    rng: StdRng,
    hoard_above: Decimal,
}

impl InterestSaver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            hoard_above: Decimal::new(105, 2),
        }
    }

    /// Whether this round's interest makes keeping gold the better play.
    pub fn hoarding(&self, view: &RoundView) -> bool {
        match view.bank_state.next_step() {
            Some(step) => step.interest > self.hoard_above && view.me().gold < step.limit,
            None => false,
        }
    }
}

impl BiddingStrategy for InterestSaver {
    fn name(&self) -> &str {
        "interest_saver"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        let me = view.me();
        let share = if self.hoarding(view) { 0.2 } else { 0.6 };
        let cap = (me.gold as f64 * 0.4) as i64;

        let mut bids: Vec<(String, i64)> = view
            .auctions
            .iter()
            .map(|(id, lot)| {
                let bid = (lot_value(lot) * POINT_VALUE * share) as i64 + self.rng.gen_range(-5..=5);
                (id.clone(), bid.min(cap).max(1))
            })
            .collect();

        let total: i64 = bids.iter().map(|(_, b)| b).sum();
        if total > me.gold as i64 {
            let scale = me.gold as f64 / total as f64 * 0.95;
            for (_, bid) in bids.iter_mut() {
                *bid = (*bid as f64 * scale) as i64;
            }
        }

        let mut resp = BidResponse::empty();
        for (id, bid) in bids {
            resp = resp.with_bid(id, bid);
        }
        if me.gold < 200 && me.points > 50 && view.pool_gold > 500 {
            resp = resp.with_pool(20);
        }
        resp
    }
}
