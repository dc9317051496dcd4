//! Core engine: round settlement and the game loop around it.

pub mod bank;
pub mod generator;
pub mod house;
pub mod rewards;
pub mod runner;
