//! Bidding strategies.
//!
//! Each strategy is a per-agent object that sees one `RoundView` per round
//! and answers with a `BidResponse`. State a strategy keeps between rounds
//! (price history, a walking bid) lives on the object itself.
//!
//! Strategies are free to send nonsense: the auction house validates every
//! entry, so none of them need to be careful about overspending.

pub mod all_in;
pub mod interest_saver;
pub mod linear_ev;
pub mod passive;
pub mod random_walk;
pub mod tiered;
pub mod tiny;
pub mod value_dumper;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{BidResponse, GavelError, ResolvedAuction, RewardDescriptor, RoundView};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait BiddingStrategy: Send {
    fn name(&self) -> &str;

    fn make_bid(&mut self, view: &RoundView) -> BidResponse;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Passive,
    Tiny,
    AllIn,
    RandomWalk,
    LinearEv,
    ValueDumper,
    InterestSaver,
    Tiered,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Passive,
        StrategyKind::Tiny,
        StrategyKind::AllIn,
        StrategyKind::RandomWalk,
        StrategyKind::LinearEv,
        StrategyKind::ValueDumper,
        StrategyKind::InterestSaver,
        StrategyKind::Tiered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Passive => "passive",
            StrategyKind::Tiny => "tiny",
            StrategyKind::AllIn => "all_in",
            StrategyKind::RandomWalk => "random_walk",
            StrategyKind::LinearEv => "linear_ev",
            StrategyKind::ValueDumper => "value_dumper",
            StrategyKind::InterestSaver => "interest_saver",
            StrategyKind::Tiered => "tiered",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = GavelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| GavelError::Config(format!("unknown strategy: {s}")))
    }
}

/// Build a fresh strategy object. `seed` drives any randomness it uses.
pub fn build(kind: StrategyKind, seed: u64) -> Box<dyn BiddingStrategy> {
    match kind {
        StrategyKind::Passive => Box::new(passive::Passive::new()),
        StrategyKind::Tiny => Box::new(tiny::TinyBidder::new(seed)),
        StrategyKind::AllIn => Box::new(all_in::AllIn::new(seed)),
        StrategyKind::RandomWalk => Box::new(random_walk::RandomWalk::new(seed, 10)),
        StrategyKind::LinearEv => Box::new(linear_ev::LinearEv::new(seed)),
        StrategyKind::ValueDumper => Box::new(value_dumper::ValueDumper::new(seed)),
        StrategyKind::InterestSaver => Box::new(interest_saver::InterestSaver::new(seed)),
        StrategyKind::Tiered => Box::new(tiered::Tiered::new(seed)),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Expected value of a lot, or 0 when the lot cannot be valued.
pub(crate) fn lot_value(lot: &RewardDescriptor) -> f64 {
    lot.expected_value().unwrap_or(0.0)
}

/// `(expected value, winning price)` for every contested lot of the
/// previous round with a positive expected value.
pub(crate) fn clearing_prices(view: &RoundView) -> impl Iterator<Item = (f64, u64)> + '_ {
    view.prev_auctions.values().filter_map(|a: &ResolvedAuction| {
        let price = a.winner()?.gold;
        let ev = lot_value(&a.lot);
        (ev > 0.0).then_some((ev, price))
    })
}

/// Linear-interpolated percentile, `p` in 0..=100.
pub(crate) fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let k = (sorted.len() - 1) as f64 * p / 100.0;
    let (lo, hi) = (k.floor() as usize, k.ceil() as usize);
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] * (hi as f64 - k) + sorted[hi] * (k - lo as f64)
}

/// Points to sell into the pool: a little when short of gold, more when
/// the pool is rich, more still when trailing the leader.
pub(crate) fn pool_request(gold: u64, points: u64, pool_gold: u64, trailing: bool) -> i64 {
    let mut want = 0;
    if gold < 150 && points > 50 {
        want = 30;
    }
    if pool_gold > 3500 && points > 100 {
        want = if trailing { 60 } else { 25 };
    }
    if want > points {
        want = (points as f64 * 0.9) as u64;
    }
    want as i64
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BidRecord, ResolvedAuction};
    use testing::make_view;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(build(kind, 1).name(), kind.as_str());
        }
        assert!("martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_clearing_prices_skips_empty_lots() {
        let mut view = make_view(100, 0);
        view.prev_auctions.insert(
            "0-0".into(),
            ResolvedAuction {
                lot: RewardDescriptor::new(20, 1, 0),
                reward: Some(11),
                bids: vec![BidRecord { a_id: "rival".into(), gold: 300 }],
            },
        );
        view.prev_auctions.insert(
            "0-1".into(),
            ResolvedAuction {
                lot: RewardDescriptor::new(6, 1, 0),
                reward: None,
                bids: vec![],
            },
        );
        let prices: Vec<_> = clearing_prices(&view).collect();
        assert_eq!(prices, vec![(10.5, 300)]);
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0), 3.0);
        assert!((percentile(&[1.0, 2.0], 80.0) - 1.8).abs() < 1e-9);
        assert_eq!(percentile(&[], 80.0), 0.0);
    }

    #[test]
    fn test_pool_request_rules() {
        assert_eq!(pool_request(100, 60, 0, false), 30);
        assert_eq!(pool_request(1000, 200, 4000, true), 60);
        assert_eq!(pool_request(1000, 200, 4000, false), 25);
        assert_eq!(pool_request(1000, 10, 0, false), 0);
    }

    #[test]
    fn test_every_strategy_answers_with_no_lots() {
        let mut view = make_view(500, 50);
        view.auctions.clear();
        for kind in StrategyKind::ALL {
            let resp = build(kind, 3).make_bid(&view);
            assert!(resp.bids.is_empty(), "{kind}");
        }
    }
}
