//! Game-state engine: turn progression, permit market, outcome evaluation.

mod outcome;
mod state;

pub use outcome::{GameOutcome, IndustryResult, OutcomeClass};
pub use state::{
    GameState, InvestmentOutcome, MarketState, PendingInvestment, Phase, TurnReport,
};
