//! Auction ledger.
//!
//! Holds the lots opened for one round and the sealed bids placed on them.
//! Ranking is highest gold first; equal gold goes to the earlier submission
//! and then to the lower agent id, so a replay of the same submissions
//! always produces the same order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{AgentId, AuctionId, BidRecord, GavelError, ResolvedAuction, RewardDescriptor};

// ---------------------------------------------------------------------------
// Bids
// ---------------------------------------------------------------------------

/// A sealed bid as held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBid {
    pub agent_id: AgentId,
    pub gold: u64,
    /// Registration order within the round.
    pub sequence: u64,
}

impl SealedBid {
    fn rank(a: &SealedBid, b: &SealedBid) -> Ordering {
        b.gold
            .cmp(&a.gold)
            .then_with(|| a.sequence.cmp(&b.sequence))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    }
}

#[derive(Debug, Clone)]
struct Lot {
    reward: RewardDescriptor,
    bids: Vec<SealedBid>,
}

/// Outcome of one lot before rewards are realized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotOutcome {
    pub auction_id: AuctionId,
    pub reward: RewardDescriptor,
    /// All bids, best first.
    pub ranking: Vec<SealedBid>,
}

impl LotOutcome {
    pub fn winner(&self) -> Option<&SealedBid> {
        self.ranking.first()
    }

    /// Wire record for the previous-round view.
    pub fn to_record(&self, realized: Option<i64>) -> ResolvedAuction {
        ResolvedAuction {
            lot: self.reward,
            reward: realized,
            bids: self
                .ranking
                .iter()
                .map(|b| BidRecord {
                    a_id: b.agent_id.clone(),
                    gold: b.gold,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One round's lots and bids.
#[derive(Debug, Clone, Default)]
pub struct AuctionBook {
    lots: BTreeMap<AuctionId, Lot>,
}

impl AuctionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a lot. Ids must be unique within the round and the reward
    /// must value cleanly.
    pub fn open(&mut self, auction_id: impl Into<AuctionId>, reward: RewardDescriptor) -> Result<(), GavelError> {
        let auction_id = auction_id.into();
        reward.validate()?;
        if self.lots.contains_key(&auction_id) {
            return Err(GavelError::DuplicateAuction(auction_id));
        }
        self.lots.insert(
            auction_id,
            Lot {
                reward,
                bids: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn contains(&self, auction_id: &str) -> bool {
        self.lots.contains_key(auction_id)
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Lots currently open, keyed by id.
    pub fn lots(&self) -> BTreeMap<AuctionId, RewardDescriptor> {
        self.lots
            .iter()
            .map(|(id, lot)| (id.clone(), lot.reward))
            .collect()
    }

    /// Gold the agent currently has bid on this lot, if any.
    pub fn bid_of(&self, auction_id: &str, agent_id: &str) -> Option<u64> {
        self.lots
            .get(auction_id)?
            .bids
            .iter()
            .find(|b| b.agent_id == agent_id)
            .map(|b| b.gold)
    }

    /// Total gold the agent has bid across every lot this round.
    pub fn committed_by(&self, agent_id: &str) -> u64 {
        self.lots
            .values()
            .flat_map(|lot| lot.bids.iter())
            .filter(|b| b.agent_id == agent_id)
            .map(|b| b.gold)
            .sum()
    }

    /// Place a bid. A second bid by the same agent on the same lot replaces
    /// the first and takes the new sequence number. Returns the replaced
    /// amount, if any.
    pub fn place(
        &mut self,
        auction_id: &str,
        agent_id: &str,
        gold: u64,
        sequence: u64,
    ) -> Result<Option<u64>, GavelError> {
        let lot = self
            .lots
            .get_mut(auction_id)
            .ok_or_else(|| GavelError::UnknownAuction(auction_id.to_string()))?;

        let replaced = lot
            .bids
            .iter()
            .position(|b| b.agent_id == agent_id)
            .map(|i| lot.bids.remove(i).gold);

        lot.bids.push(SealedBid {
            agent_id: agent_id.to_string(),
            gold,
            sequence,
        });
        Ok(replaced)
    }

    /// Rank one lot's bids without consuming the book.
    pub fn rank(&self, auction_id: &str) -> Result<LotOutcome, GavelError> {
        let lot = self
            .lots
            .get(auction_id)
            .ok_or_else(|| GavelError::UnknownAuction(auction_id.to_string()))?;
        let mut ranking = lot.bids.clone();
        ranking.sort_by(SealedBid::rank);
        Ok(LotOutcome {
            auction_id: auction_id.to_string(),
            reward: lot.reward,
            ranking,
        })
    }

    /// Rank every lot, in auction-id order. Lots are independent of each other.
    pub fn resolve_all(&self) -> Vec<LotOutcome> {
        self.lots
            .iter()
            .map(|(id, lot)| {
                let mut ranking = lot.bids.clone();
                ranking.sort_by(SealedBid::rank);
                if let Some(w) = ranking.first() {
                    debug!(
                        auction_id = %id,
                        winner = %w.agent_id,
                        gold = w.gold,
                        bids = ranking.len(),
                        "Lot ranked"
                    );
                }
                LotOutcome {
                    auction_id: id.clone(),
                    reward: lot.reward,
                    ranking,
                }
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.lots.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
