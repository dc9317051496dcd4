//! Linear price model.
//!
//! Fits `price = k·ev + b` by least squares over recent clearing prices and
//! bids the prediction on the lots that give the most expected value per
//! gold. Spend grows as the game progresses, and faster when trailing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use super::{clearing_prices, lot_value, percentile, pool_request, BiddingStrategy};
use crate::types::{BidResponse, RoundView};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const HISTORY: usize = 200;
const RECENT_WINS: usize = 100;
const MIN_SAMPLES: usize = 12;
const FALLBACK_SLOPE: f64 = 35.0;
const MAX_LOTS: usize = 16;
const PER_LOT_CAP: f64 = 0.32;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

pub struct LinearEv {
    rng: StdRng,
    /// `(ev, price)` samples.
    samples: VecDeque<(f64, f64)>,
    wins: VecDeque<f64>,
}

impl LinearEv {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            samples: VecDeque::with_capacity(HISTORY),
            wins: VecDeque::with_capacity(RECENT_WINS),
        }
    }

    fn learn(&mut self, view: &RoundView) {
        for (ev, price) in clearing_prices(view) {
            if self.samples.len() == HISTORY {
                self.samples.pop_front();
            }
            self.samples.push_back((ev, price as f64));
            if self.wins.len() == RECENT_WINS {
                self.wins.pop_front();
            }
            self.wins.push_back(price as f64);
        }
    }

    /// Least-squares slope and intercept.
    pub fn fit(&self) -> (f64, f64) {
        if self.samples.len() < MIN_SAMPLES {
            return (FALLBACK_SLOPE, 0.0);
        }
        let n = self.samples.len() as f64;
        let (sx, sy, sxy, sxx) = self.samples.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, (x, y)| {
            (acc.0 + x, acc.1 + y, acc.2 + x * y, acc.3 + x * x)
        });
        let denom = n * sxx - sx * sx;
        if denom.abs() < f64::EPSILON {
            return (FALLBACK_SLOPE, 0.0);
        }
        let k = (n * sxy - sx * sy) / denom;
        (k, (sy - k * sx) / n)
    }
}

impl BiddingStrategy for LinearEv {
    fn name(&self) -> &str {
        "linear_ev"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        self.learn(view);

        let me = view.me();
        let gold = me.gold;
        let rounds_left = view.bank_state.rounds_remaining() as f64;
        let phase = view.round as f64 / (view.round as f64 + rounds_left).max(1.0);
        let leader = view.others().map(|(_, s)| s.points).max();
        let trailing = leader.is_some_and(|l| (me.points as f64) < 0.8 * l as f64);

        // Budget
        let reserve = 150u64.max(gold / 20);
        let mut spend_frac = if phase < 0.3 {
            0.45
        } else if phase < 0.75 {
            0.55
        } else {
            0.78
        };
        if trailing {
            spend_frac += 0.10;
        }
        let spend_cap = ((spend_frac * gold as f64) as u64).min(gold.saturating_sub(reserve));

        // Model
        let (k, b) = self.fit();
        let avg_win = if self.wins.is_empty() {
            400.0
        } else {
            self.wins.iter().sum::<f64>() / self.wins.len() as f64
        };
        let tie = ((avg_win * 1.10) as u64).min((gold as f64 * 0.30) as u64);

        let evs: Vec<(String, f64)> = view
            .auctions
            .iter()
            .map(|(id, lot)| (id.clone(), lot_value(lot)))
            .filter(|(_, ev)| *ev > 0.0)
            .collect();
        let top = if evs.is_empty() {
            f64::MAX
        } else {
            percentile(&evs.iter().map(|(_, ev)| *ev).collect::<Vec<_>>(), 80.0)
        };

        let mut scored: Vec<(f64, String, u64)> = evs
            .into_iter()
            .map(|(id, ev)| {
                let mut pred = ((k * ev + b) as i64).max(1) as u64;
                pred = pred.min((PER_LOT_CAP * gold as f64) as u64);
                if ev >= top {
                    pred = pred.max(tie);
                }
                let efficiency = ev / (0.5 * pred as f64).max(1.0);
                (efficiency, id, pred)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        // Allocation
        let mut resp = BidResponse::empty();
        let mut spent = 0u64;
        for (_, id, pred) in scored.into_iter().take(MAX_LOTS) {
            if spent + pred > spend_cap {
                continue;
            }
            let bid = (pred as f64 * self.rng.gen_range(1.0..1.02)) as u64;
            if bid > 0 && bid <= gold - spent {
                spent += bid;
                resp = resp.with_bid(id, bid as i64);
            }
        }

        resp.with_pool(pool_request(gold, me.points, view.pool_gold, trailing))
    }
}
