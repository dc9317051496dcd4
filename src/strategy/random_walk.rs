//! A single bid whose size walks up after a win and down after a loss.

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};

use super::BiddingStrategy;
use crate::types::{AuctionId, BidResponse, RoundView};

pub struct RandomWalk {
    rng: StdRng,
    step: u64,
    current_bid: u64,
    last_target: Option<AuctionId>,
}

impl RandomWalk {
    pub fn new(seed: u64, step: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let current_bid = rng.gen_range(1..=100);
        Self {
            rng,
            step: step.max(1),
            current_bid,
            last_target: None,
        }
    }

    pub fn current_bid(&self) -> u64 {
        self.current_bid
    }

    fn walk(&mut self, view: &RoundView) {
        let Some(last) = self.last_target.as_ref() else {
            return;
        };
        let Some(winner) = view.prev_auctions.get(last).and_then(|a| a.winner()) else {
            return;
        };
        let delta = self.rng.gen_range(1..=self.step);
        if winner.a_id == view.agent_id {
            self.current_bid += delta;
        } else {
            self.current_bid = self.current_bid.saturating_sub(delta);
        }
    }
}

impl BiddingStrategy for RandomWalk {
    fn name(&self) -> &str {
        "random_walk"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        let me = view.me();
        if me.gold < self.current_bid {
            self.current_bid = (me.gold / 2).max(1);
        }
        self.walk(view);
        self.current_bid = self.current_bid.max(1);

        let mut resp = BidResponse::empty();
        if me.gold > 0 {
            if let Some(target) = view.auctions.keys().choose(&mut self.rng).cloned() {
                resp = resp.with_bid(target.clone(), self.current_bid.min(me.gold) as i64);
                self.last_target = Some(target);
            }
        }

        if me.gold < 50 && me.points > 20 {
            resp = resp.with_pool(20);
        }
        resp
    }
}
