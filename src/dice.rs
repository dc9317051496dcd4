//! Dice-bag valuation.
//!
//! A lot's reward is `num` rolls of a single die face plus a flat bonus.
//! Only the standard polyhedral faces are legal; anything else is a
//! configuration error and must surface as one rather than valuing the
//! lot at zero.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::GavelError;

// ---------------------------------------------------------------------------
// Die faces
// ---------------------------------------------------------------------------

/// A standard die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Die {
    D2,
    D3,
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl Die {
    /// Every legal face, smallest first.
    pub const ALL: &'static [Die] = &[
        Die::D2,
        Die::D3,
        Die::D4,
        Die::D6,
        Die::D8,
        Die::D10,
        Die::D12,
        Die::D20,
    ];

    /// Number of faces.
    pub fn sides(self) -> u32 {
        match self {
            Die::D2 => 2,
            Die::D3 => 3,
            Die::D4 => 4,
            Die::D6 => 6,
            Die::D8 => 8,
            Die::D10 => 10,
            Die::D12 => 12,
            Die::D20 => 20,
        }
    }

    /// Mean of a single roll: `(sides + 1) / 2`.
    pub fn average_roll(self) -> f64 {
        (self.sides() as f64 + 1.0) / 2.0
    }

    /// Roll once, uniformly in `1..=sides`.
    pub fn roll<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides())
    }
}

impl TryFrom<u32> for Die {
    type Error = GavelError;

    fn try_from(sides: u32) -> Result<Self, Self::Error> {
        match sides {
            2 => Ok(Die::D2),
            3 => Ok(Die::D3),
            4 => Ok(Die::D4),
            6 => Ok(Die::D6),
            8 => Ok(Die::D8),
            10 => Ok(Die::D10),
            12 => Ok(Die::D12),
            20 => Ok(Die::D20),
            other => Err(GavelError::InvalidDie(other)),
        }
    }
}

impl From<Die> for u32 {
    fn from(die: Die) -> Self {
        die.sides()
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Most dice a single lot may roll.
pub const MAX_DICE: u32 = 100;

fn check_count(num: u32) -> Result<(), GavelError> {
    if !(1..=MAX_DICE).contains(&num) {
        return Err(GavelError::InvalidDiceCount(num));
    }
    Ok(())
}

/// Expected value of `num`d`die` + `bonus`.
///
/// Fails on an unknown face or a dice count outside `1..=MAX_DICE`. A
/// negative bonus is a legal lot and can make the expected value negative.
pub fn expected_value(die: u32, num: u32, bonus: i64) -> Result<f64, GavelError> {
    let die = Die::try_from(die)?;
    check_count(num)?;
    Ok(die.average_roll() * num as f64 + bonus as f64)
}

/// Realize one draw of `num`d`die` + `bonus`.
pub fn roll_reward<R: Rng + ?Sized>(
    die: u32,
    num: u32,
    bonus: i64,
    rng: &mut R,
) -> Result<i64, GavelError> {
    let die = Die::try_from(die)?;
    check_count(num)?;
    let total: i64 = (0..num).map(|_| die.roll(rng) as i64).sum();
    Ok(total + bonus)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
