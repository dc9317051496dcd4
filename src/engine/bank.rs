//! Bank schedule and end-of-round income/interest.
//!
//! The schedule is fixed at game start and consumed one step per round.
//! Agents see it forward-looking from the current round, so they can plan
//! around future income and interest.

use rand::Rng;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AgentAccount, BankState, BankStep, GavelError};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How the round's bank limit constrains interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Interest is earned only on gold up to the limit.
    #[default]
    InterestCap,
    /// Interest is earned on the whole balance, but cannot lift it past the limit.
    ClampTotal,
}

/// Gold credited to one account by one bank step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankCredit {
    pub income: u64,
    pub interest: u64,
}

/// Apply one step to one account: income first, then interest.
/// Rates at or below 1.0 pay no interest; balances never shrink here.
pub fn apply_step(account: &mut AgentAccount, step: &BankStep, policy: LimitPolicy) -> BankCredit {
    account.gold += step.income;

    let interest = if step.interest <= Decimal::ONE {
        0
    } else {
        match policy {
            LimitPolicy::InterestCap => {
                let base = Decimal::from(account.gold.min(step.limit));
                floor_gold(base * (step.interest - Decimal::ONE))
            }
            LimitPolicy::ClampTotal => {
                let grown = floor_gold(Decimal::from(account.gold) * step.interest);
                let target = grown.min(step.limit).max(account.gold);
                target - account.gold
            }
        }
    };
    account.gold += interest;

    BankCredit {
        income: step.income,
        interest,
    }
}

fn floor_gold(amount: Decimal) -> u64 {
    amount.floor().to_u64().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Generation bounds for a random schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub income_min: u64,
    pub income_max: u64,
    pub interest_min: Decimal,
    pub interest_max: Decimal,
    pub limit_min: u64,
    pub limit_max: u64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            income_min: 50,
            income_max: 150,
            interest_min: Decimal::new(100, 2),
            interest_max: Decimal::new(120, 2),
            limit_min: 1000,
            limit_max: 4000,
        }
    }
}

impl BankConfig {
    pub fn validate(&self) -> Result<(), GavelError> {
        if self.income_min > self.income_max {
            return Err(GavelError::Config("bank.income_min > bank.income_max".into()));
        }
        if self.interest_min > self.interest_max {
            return Err(GavelError::Config("bank.interest_min > bank.interest_max".into()));
        }
        if self.interest_min < Decimal::ZERO {
            return Err(GavelError::Config("bank.interest_min must be >= 0".into()));
        }
        if self.limit_min > self.limit_max {
            return Err(GavelError::Config("bank.limit_min > bank.limit_max".into()));
        }
        Ok(())
    }
}

/// The whole game's bank schedule, one step per round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankSchedule {
    steps: Vec<BankStep>,
}

impl BankSchedule {
    pub fn new(steps: Vec<BankStep>) -> Self {
        Self { steps }
    }

    /// Draw a schedule of `rounds` steps. Interest is kept to two decimals.
    pub fn generate<R: Rng + ?Sized>(rounds: usize, cfg: &BankConfig, rng: &mut R) -> Result<Self, GavelError> {
        cfg.validate()?;
        let lo = (cfg.interest_min * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(100);
        let hi = (cfg.interest_max * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(lo);

        let steps = (0..rounds)
            .map(|_| BankStep {
                income: rng.gen_range(cfg.income_min..=cfg.income_max),
                interest: Decimal::new(rng.gen_range(lo..=hi), 2),
                limit: rng.gen_range(cfg.limit_min..=cfg.limit_max),
            })
            .collect::<Vec<_>>();

        debug!(rounds, "Bank schedule generated");
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&BankStep> {
        self.steps.get(index)
    }

    /// Agent-facing view of the schedule from `index` onward.
    pub fn view_from(&self, index: usize) -> BankState {
        let rest = self.steps.get(index..).unwrap_or(&[]);
        BankState {
            gold_income_per_round: rest.iter().map(|s| s.income).collect(),
            bank_interest_per_round: rest.iter().map(|s| s.interest).collect(),
            bank_limit_per_round: rest.iter().map(|s| s.limit).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
