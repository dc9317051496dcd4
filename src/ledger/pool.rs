//! Pool ledger.
//!
//! Agents sell points into a shared gold pool. Points are debited when the
//! request is registered (by the auction house); gold is paid out when the
//! round resolves, split in proportion to the points each seller put in.
//!
//! Payouts are floored. Whatever the flooring leaves behind stays in the
//! pool. A seller who put in any points is paid at least one gold.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::types::{AgentId, GavelError};

/// Result of distributing the pool for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolDistribution {
    pub payouts: BTreeMap<AgentId, u64>,
    pub total_points: u64,
    pub gold_before: u64,
    /// Gold paid out that the pool actually held.
    pub distributed: u64,
    /// Gold paid out beyond the pool balance because of the one-gold floor.
    pub minted: u64,
}

impl PoolDistribution {
    /// Pool balance after payouts (never negative).
    pub fn gold_after(&self) -> u64 {
        self.gold_before - self.distributed
    }

    pub fn total_paid(&self) -> u64 {
        self.distributed + self.minted
    }
}

/// One round's pool requests.
#[derive(Debug, Clone, Default)]
pub struct PoolBook {
    requests: BTreeMap<AgentId, u64>,
}

impl PoolBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-debited request. One request per agent per round.
    pub fn register(&mut self, agent_id: &str, points: u64) -> Result<(), GavelError> {
        if self.requests.contains_key(agent_id) {
            return Err(GavelError::DuplicatePoolBuy(agent_id.to_string()));
        }
        self.requests.insert(agent_id.to_string(), points);
        Ok(())
    }

    pub fn requests(&self) -> &BTreeMap<AgentId, u64> {
        &self.requests
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.requests.contains_key(agent_id)
    }

    pub fn total_points(&self) -> u64 {
        self.requests.values().sum()
    }

    /// Split `gold_in_pool` across the registered requests.
    pub fn distribute(&self, gold_in_pool: u64) -> PoolDistribution {
        let total_points = self.total_points();
        let divisor = total_points.max(1) as u128;

        let mut payouts = BTreeMap::new();
        let mut paid: u64 = 0;
        for (agent_id, &points) in &self.requests {
            let mut gold = (gold_in_pool as u128 * points as u128 / divisor) as u64;
            if points > 0 {
                gold = gold.max(1);
            }
            paid += gold;
            payouts.insert(agent_id.clone(), gold);
        }

        let distributed = paid.min(gold_in_pool);
        let minted = paid - distributed;
        if minted > 0 {
            warn!(
                gold_in_pool,
                paid, minted, "Pool floor paid out more than the pool held"
            );
        }

        debug!(
            sellers = payouts.len(),
            total_points,
            gold_in_pool,
            distributed,
            "Pool distributed"
        );

        PoolDistribution {
            payouts,
            total_points,
            gold_before: gold_in_pool,
            distributed,
            minted,
        }
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
