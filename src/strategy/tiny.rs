//! Small random bids on as many lots as gold allows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::BiddingStrategy;
use crate::types::{BidResponse, RoundView};

pub struct TinyBidder {
    rng: StdRng,
}

impl TinyBidder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BiddingStrategy for TinyBidder {
    fn name(&self) -> &str {
        "tiny"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        let me = view.me();
        let mut gold = me.gold;
        let mut resp = BidResponse::empty();

        let mut ids: Vec<_> = view.auctions.keys().cloned().collect();
        ids.shuffle(&mut self.rng);
        for id in ids {
            let bid = self.rng.gen_range(1..=50u64);
            if bid < gold {
                gold -= bid;
                resp = resp.with_bid(id, bid as i64);
            } else if gold > 0 {
                // keep a foot in the door
                gold -= 1;
                resp = resp.with_bid(id, 1);
            }
        }

        if me.gold < 100 && me.points > 50 {
            resp = resp.with_pool(20);
        }
        resp
    }
}
