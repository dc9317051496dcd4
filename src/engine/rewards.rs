//! Reward realization.
//!
//! The auction house only knows that a winner takes a lot; how many points
//! that turns into is decided here. Rolls are seeded per round so a
//! recorded round can be resolved again with identical rewards.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dice;
use crate::types::{GavelError, RewardDescriptor};

/// Turns a won lot into points.
pub trait RewardSource: Send {
    fn realize(&mut self, lot: &RewardDescriptor) -> Result<i64, GavelError>;
}

/// Which reward source a game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    /// Roll the dice.
    #[default]
    Roll,
    /// Pay the floor of the expected value.
    Expected,
}

impl RewardMode {
    /// Build the source for one round.
    pub fn source(self, round_seed: u64) -> Box<dyn RewardSource> {
        match self {
            RewardMode::Roll => Box::new(DiceRoller::new(round_seed)),
            RewardMode::Expected => Box::new(ExpectedReward),
        }
    }
}

/// Derive a round's reward seed from the game seed.
pub fn round_seed(game_seed: u64, round: u64) -> u64 {
    game_seed ^ round.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct DiceRoller {
    rng: StdRng,
}

impl DiceRoller {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RewardSource for DiceRoller {
    fn realize(&mut self, lot: &RewardDescriptor) -> Result<i64, GavelError> {
        dice::roll_reward(lot.die, lot.num, lot.bonus, &mut self.rng)
    }
}

pub struct ExpectedReward;

impl RewardSource for ExpectedReward {
    fn realize(&mut self, lot: &RewardDescriptor) -> Result<i64, GavelError> {
        Ok(lot.expected_value()?.floor() as i64)
    }
}
