//! Percentile tracker with tiered spending.
//!
//! Keeps a rolling history of `price / ev` across every contested lot and
//! prices each new lot by its expected-value tier: the bottom third gets a
//! token bid just above the usual small bidders, the middle third the 70th
//! percentile ratio, the top third the 85th. Each lot is also priced
//! against a rival that scales its mean winning bid by the dice on offer,
//! and the higher of the two is bid. Aggression drifts toward whatever the
//! market has been paying.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

use super::{lot_value, percentile, pool_request, BiddingStrategy};
use crate::types::{BidResponse, RewardDescriptor, RoundView};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const RATIO_HISTORY: usize = 400;
const WIN_HISTORY: usize = 120;
const DEFAULT_R70: f64 = 35.0;
const DEFAULT_R85: f64 = 45.0;
const DEFAULT_MEAN_WIN: f64 = 400.0;
const PER_LOT_SHARE: f64 = 0.40;
const BASE_BID_SHARE: f64 = 0.35;
const MIN_AGGRESSION: f64 = 0.92;
const MAX_AGGRESSION: f64 = 1.22;

/// Multiplier a dice-driven rival applies to its mean winning bid.
pub fn dice_numbers_multiplier(lot: &RewardDescriptor) -> f64 {
    let mut m = match lot.die {
        d if d >= 12 => 1.2,
        d if d >= 8 => 1.0,
        d if d >= 6 => 0.9,
        _ => 0.7,
    };
    if lot.num >= 5 {
        m *= 1.3;
    } else if lot.num >= 3 {
        m *= 1.1;
    }
    if lot.bonus > 10 {
        m *= 1.2;
    } else if lot.bonus > 5 {
        m *= 1.1;
    } else if lot.bonus < 0 {
        m *= 0.8;
    }
    m
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

pub struct Tiered {
    rng: StdRng,
    /// Winning price over expected value.
    ratios: VecDeque<f64>,
    wins: VecDeque<f64>,
    aggression: f64,
}

impl Tiered {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ratios: VecDeque::with_capacity(RATIO_HISTORY),
            wins: VecDeque::with_capacity(WIN_HISTORY),
            aggression: 1.0,
        }
    }

    pub fn aggression(&self) -> f64 {
        self.aggression
    }

    fn learn(&mut self, view: &RoundView) {
        for auction in view.prev_auctions.values() {
            let Some(winner) = auction.winner() else {
                continue;
            };
            let price = winner.gold as f64;
            if self.wins.len() == WIN_HISTORY {
                self.wins.pop_front();
            }
            self.wins.push_back(price);

            let ev = lot_value(&auction.lot);
            if ev > 0.0 {
                if self.ratios.len() == RATIO_HISTORY {
                    self.ratios.pop_front();
                }
                self.ratios.push_back(price / ev.max(1.0));
            }
        }
    }

    fn ratio_at(&self, p: f64, default: f64) -> f64 {
        if self.ratios.is_empty() {
            return default;
        }
        let ratios: Vec<f64> = self.ratios.iter().copied().collect();
        percentile(&ratios, p)
    }

    fn adapt(&mut self, bids: &[u64]) {
        if self.wins.is_empty() {
            return;
        }
        let wins: Vec<f64> = self.wins.iter().copied().collect();
        let p70 = percentile(&wins, 70.0);
        let my_avg = bids.iter().sum::<u64>() as f64 / bids.len().max(1) as f64;
        if my_avg < 0.9 * p70 {
            self.aggression = (self.aggression * 1.03).min(MAX_AGGRESSION);
        } else if my_avg > 1.25 * p70 {
            self.aggression = (self.aggression * 0.985).max(MIN_AGGRESSION);
        }
    }
}

impl BiddingStrategy for Tiered {
    fn name(&self) -> &str {
        "tiered"
    }

    fn make_bid(&mut self, view: &RoundView) -> BidResponse {
        self.learn(view);

        let me = view.me();
        let gold = me.gold;
        let rounds_left = view.bank_state.rounds_remaining();
        let phase = view.round as f64 / (view.round as f64 + rounds_left as f64).max(1.0);
        let leader = view.others().map(|(_, s)| s.points).max();
        let trailing = leader.is_some_and(|l| (me.points as f64) < 0.8 * l as f64);
        let pool = pool_request(gold, me.points, view.pool_gold, trailing);

        // Rich rounds bring bigger small bidders.
        let next_income = view.bank_state.gold_income_per_round.first().copied().unwrap_or(0);
        let beat_tiny: u64 = if next_income > 1050 { 107 } else { 22 };

        let r70 = self.ratio_at(70.0, DEFAULT_R70);
        let r85 = self.ratio_at(85.0, DEFAULT_R85);

        // Budget
        let reserve = 200u64.max(gold / 20);
        let mut spend_frac = if phase < 0.3 {
            0.45
        } else if phase < 0.75 {
            0.58
        } else {
            0.80
        };
        if trailing {
            spend_frac += 0.15;
        }
        let spend_cap = gold.saturating_sub(reserve).min((spend_frac * gold as f64) as u64);
        let per_lot_cap = ((PER_LOT_SHARE * gold as f64) as u64).max(1);

        // Negative lots are only worth chasing at the very end.
        let evs: Vec<(String, f64, RewardDescriptor)> = view
            .auctions
            .iter()
            .map(|(id, lot)| (id.clone(), lot_value(lot), *lot))
            .filter(|(_, ev, _)| *ev > 0.0 || rounds_left <= 2)
            .collect();
        if evs.is_empty() {
            return BidResponse::empty().with_pool(pool);
        }

        let mut values: Vec<f64> = evs.iter().map(|(_, ev, _)| *ev).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        let q1 = values[values.len() / 3];
        let q2 = values[2 * values.len() / 3];
        let target_wins = evs.len().min(if gold > 3000 { 26 } else { 20 });
        let mean_win = if self.wins.is_empty() {
            DEFAULT_MEAN_WIN
        } else {
            self.wins.iter().sum::<f64>() / self.wins.len() as f64
        };
        let base_cap = (BASE_BID_SHARE * gold as f64) as i64;

        // Tier prices
        let mut ranked: Vec<(f64, String, u64)> = Vec::with_capacity(evs.len());
        for (id, ev, lot) in &evs {
            let rival = (mean_win * dice_numbers_multiplier(lot)) as i64;
            let rival_edge = (rival as f64 * 1.06) as i64;
            let tier_bid = if *ev <= q1 {
                (beat_tiny + self.rng.gen_range(0..=2)) as i64
            } else if *ev <= q2 {
                (ev * r70 * self.aggression) as i64
            } else {
                (ev * r85 * self.aggression) as i64
            };
            let base = rival_edge.max(tier_bid).min(base_cap);
            let efficiency = ev / base.max(1) as f64;
            let bid = (base.max(0) as f64 * self.rng.gen_range(1.00..1.03)) as u64;
            ranked.push((efficiency, id.clone(), bid));
        }
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        // Allocation
        let mut resp = BidResponse::empty();
        let mut placed: Vec<u64> = Vec::new();
        let mut spent = 0u64;
        for (_, id, bid) in ranked {
            if placed.len() >= target_wins {
                break;
            }
            let bid = bid.min(per_lot_cap);
            if bid == 0 || spent + bid > spend_cap {
                continue;
            }
            spent += bid;
            placed.push(bid);
            resp = resp.with_bid(id, bid as i64);
        }

        // Filler on the cheap tier
        if spent < spend_cap && placed.len() < target_wins + 6 {
            let filler: u64 = if beat_tiny <= 22 { 26 } else { 103 };
            let mut cheap: Vec<&String> = evs
                .iter()
                .filter(|(id, ev, _)| *ev <= q1 && !resp.bids.contains_key(id))
                .map(|(id, _, _)| id)
                .collect();
            cheap.shuffle(&mut self.rng);
            for id in cheap {
                if spent + filler > spend_cap {
                    break;
                }
                spent += filler;
                placed.push(filler);
                resp = resp.with_bid(id.clone(), filler as i64);
            }
        }

        self.adapt(&placed);
        debug!(
            round = view.round,
            lots = placed.len(),
            spent,
            spend_cap,
            aggression = self.aggression,
            "Tiered bids placed"
        );

        resp.with_pool(pool)
    }
}
