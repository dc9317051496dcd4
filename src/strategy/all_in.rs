//! One big bid per round on a random lot.

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};

use super::BiddingStrategy;
use crate::types::{BidResponse, RoundView};

pub struct AllIn {
    rng: StdRng,
}

impl AllIn {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BiddingStrategy for AllIn {
    fn name(&self) -> &str {
        "all_in"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        let me = view.me();
        let Some(target) = view.auctions.keys().choose(&mut self.rng).cloned() else {
            return BidResponse::empty();
        };

        let mut resp = BidResponse::empty();
        if me.gold > 0 {
            let richest = view.others().map(|(_, s)| s.gold).max().unwrap_or(0).max(1);
            let share = self.rng.gen_range(0.5..0.9);
            // No point outbidding what anyone else could pay.
            let bid = ((me.gold as f64 * share) as u64).min(richest + 50).max(1);
            resp = resp.with_bid(target, bid as i64);
        }

        if me.gold < 50 && me.points > 20 {
            resp = resp.with_pool(20);
        }
        resp
    }
}
