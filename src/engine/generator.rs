//! Lot generation.
//!
//! Opens a fresh set of lots every round from a seeded RNG so a game can
//! be reproduced from its seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dice::{self, Die};
use crate::types::{AuctionId, GavelError, RewardDescriptor};

/// Bounds for generated lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    pub per_round: usize,
    pub max_num: u32,
    pub min_bonus: i64,
    pub max_bonus: i64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            per_round: 8,
            max_num: 4,
            min_bonus: -2,
            max_bonus: 6,
        }
    }
}

impl AuctionConfig {
    pub fn validate(&self) -> Result<(), GavelError> {
        if !(1..=dice::MAX_DICE).contains(&self.max_num) {
            return Err(GavelError::Config(format!(
                "auctions.max_num must be within 1..={}",
                dice::MAX_DICE
            )));
        }
        if self.min_bonus > self.max_bonus {
            return Err(GavelError::Config("auctions.min_bonus > auctions.max_bonus".into()));
        }
        Ok(())
    }
}

pub struct AuctionGenerator {
    config: AuctionConfig,
    rng: StdRng,
}

impl AuctionGenerator {
    pub fn new(config: AuctionConfig, seed: u64) -> Result<Self, GavelError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Lots for `round`, ids `"{round}-{index}"`.
    pub fn lots_for_round(&mut self, round: u64) -> BTreeMap<AuctionId, RewardDescriptor> {
        (0..self.config.per_round)
            .map(|i| {
                let die = Die::ALL.choose(&mut self.rng).copied().unwrap_or(Die::D6);
                let lot = RewardDescriptor::new(
                    die.sides(),
                    self.rng.gen_range(1..=self.config.max_num),
                    self.rng.gen_range(self.config.min_bonus..=self.config.max_bonus),
                );
                (format!("{round}-{i}"), lot)
            })
            .collect()
    }
}
