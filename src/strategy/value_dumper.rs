//! Value investor early, liquidator late.
//!
//! Tracks the market's average gold per expected point. Until the last
//! stretch of the game it only bids below that rate and keeps most gold in
//! the bank; in the final rounds it overpays to turn all gold into points.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use super::{clearing_prices, lot_value, BiddingStrategy};
use crate::types::{BidResponse, RoundView};

const HISTORY: usize = 200;
const LIQUIDATION_ROUNDS: usize = 30;

pub struct ValueDumper {
    rng: StdRng,
    ratios: VecDeque<f64>,
    cost_per_point: f64,
}

impl ValueDumper {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ratios: VecDeque::with_capacity(HISTORY),
            cost_per_point: 30.0,
        }
    }

    pub fn cost_per_point(&self) -> f64 {
        self.cost_per_point
    }

    fn learn(&mut self, view: &RoundView) {
        for (ev, price) in clearing_prices(view) {
            if self.ratios.len() == HISTORY {
                self.ratios.pop_front();
            }
            self.ratios.push_back(price as f64 / ev);
        }
        if !self.ratios.is_empty() {
            self.cost_per_point = self.ratios.iter().sum::<f64>() / self.ratios.len() as f64;
        }
    }
}

impl BiddingStrategy for ValueDumper {
    fn name(&self) -> &str {
        "value_dumper"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        self.learn(view);

        let me = view.me();
        let gold = me.gold;
        let rounds_left = view.bank_state.rounds_remaining();

        let mut ranked: Vec<(f64, &String)> = view
            .auctions
            .iter()
            .map(|(id, lot)| (lot_value(lot), id))
            .filter(|(ev, _)| *ev > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut resp = BidResponse::empty();
        let mut spent = 0u64;

        if rounds_left <= LIQUIDATION_ROUNDS {
            // Only part of the bids win, so bid well past the per-round share.
            let budget = (gold / rounds_left.max(1) as u64) as f64 * 2.5;
            for (ev, id) in ranked {
                if spent as f64 >= budget {
                    break;
                }
                let target = (ev * self.cost_per_point * 1.5) as u64;
                let bid = target.min(gold / 2);
                if bid > 0 && spent + bid < gold {
                    spent += bid;
                    resp = resp.with_bid(id.clone(), bid as i64);
                }
            }
        } else {
            let rate = self.cost_per_point * 0.90;
            let cap = (gold as f64 * 0.40) as u64;
            for (ev, id) in ranked {
                if spent >= cap {
                    break;
                }
                let bid = ((ev * rate) as u64 as f64 * self.rng.gen_range(1.0..1.02)) as u64;
                if bid > 0 && spent + bid < gold {
                    spent += bid;
                    resp = resp.with_bid(id.clone(), bid as i64);
                }
            }
        }

        if gold < 100 && me.points > 30 {
            resp = resp.with_pool(30);
        }
        resp
    }
}
