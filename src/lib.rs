//! GAVEL — sealed-bid dice auction arena
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod dashboard;
pub mod dice;
pub mod engine;
pub mod ledger;
pub mod storage;
pub mod strategy;
pub mod types;
