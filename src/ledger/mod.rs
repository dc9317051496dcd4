//! Per-round ledgers: sealed-bid lots and the point-for-gold pool.

pub mod auction;
pub mod pool;

pub use auction::{AuctionBook, LotOutcome, SealedBid};
pub use pool::{PoolBook, PoolDistribution};
