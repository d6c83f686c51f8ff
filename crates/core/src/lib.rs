#![warn(clippy::all, missing_docs)]

//! Core domain logic for the etsim cap-and-trade simulation.
//!
//! This crate hosts the game-state engine (industries, the tile board,
//! turn progression, the permit market, and outcome evaluation) along
//! with configuration handling and save persistence used by the
//! terminal UI and any future frontends.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod save;

pub use board::{EffectKind, InvestmentKind, TileRule, TILES, TILE_COUNT};
pub use config::AppConfig;
pub use error::EngineError;
pub use game::{
    GameOutcome, GameState, IndustryResult, InvestmentOutcome, MarketState, OutcomeClass,
    PendingInvestment, Phase, TurnReport,
};
pub use models::{Industry, SizeClass};
