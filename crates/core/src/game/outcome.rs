//! Final result aggregation once both industries have finished their lap.

use serde::{Deserialize, Serialize};

use crate::models::SizeClass;

use super::state::GameState;

/// Classification of the finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeClass {
    /// Total pollution within the cap and every industry compliant.
    EveryoneWins,
    /// Total pollution within the cap but at least one industry holds
    /// fewer permits than its pollution.
    PartialSuccess,
    /// Total pollution exceeded the cap, regardless of individual
    /// compliance.
    EveryoneLoses,
}

impl OutcomeClass {
    /// Banner line for the results screen.
    pub fn headline(self) -> &'static str {
        match self {
            OutcomeClass::EveryoneWins => "EVERYONE WINS!",
            OutcomeClass::PartialSuccess => "PARTIAL SUCCESS",
            OutcomeClass::EveryoneLoses => "EVERYONE LOSES",
        }
    }

    /// One-sentence explanation of the classification.
    pub fn summary(self) -> &'static str {
        match self {
            OutcomeClass::EveryoneWins => {
                "The cap-and-trade system worked: environmental goals achieved with economic flexibility."
            }
            OutcomeClass::PartialSuccess => {
                "Market cap achieved but compliance issues exist; some regulatory enforcement needed."
            }
            OutcomeClass::EveryoneLoses => {
                "Market cap exceeded: the cap-and-trade system failed to control pollution."
            }
        }
    }
}

/// Per-industry row of the final results table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryResult {
    /// Display name.
    pub name: String,
    /// Size class assigned at setup.
    pub size_class: SizeClass,
    /// Final emissions, in kg.
    pub pollution: f64,
    /// Permits held at true-up.
    pub permits: u32,
    /// Whether held permits cover final pollution.
    pub compliant: bool,
    /// Pollution not covered by permits, in kg; zero when compliant.
    pub deficit: f64,
    /// Final funds.
    pub earnings: f64,
}

/// Aggregated final results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Sum of both industries' final pollution, in kg.
    pub total_pollution: f64,
    /// Sum of both industries' held permits.
    pub total_permits: u32,
    /// The configured pollution ceiling, in kg.
    pub market_cap: u32,
    /// Pollution beyond the cap; zero when within it.
    pub excess: f64,
    /// Win/partial/lose classification.
    pub class: OutcomeClass,
    /// One row per industry, in seating order.
    pub industries: Vec<IndustryResult>,
}

pub(super) fn evaluate(state: &GameState) -> GameOutcome {
    let total_pollution: f64 = state.industries.iter().map(|i| i.pollution).sum();
    let total_permits: u32 = state.industries.iter().map(|i| i.permits).sum();
    let all_compliant = state.industries.iter().all(|i| i.is_compliant());
    let cap = f64::from(state.market.market_cap);

    let class = if total_pollution <= cap {
        if all_compliant {
            OutcomeClass::EveryoneWins
        } else {
            OutcomeClass::PartialSuccess
        }
    } else {
        OutcomeClass::EveryoneLoses
    };

    GameOutcome {
        total_pollution,
        total_permits,
        market_cap: state.market.market_cap,
        excess: (total_pollution - cap).max(0.0),
        class,
        industries: state
            .industries
            .iter()
            .map(|industry| IndustryResult {
                name: industry.name.clone(),
                size_class: industry.size_class,
                pollution: industry.pollution,
                permits: industry.permits,
                compliant: industry.is_compliant(),
                deficit: industry.deficit(),
                earnings: industry.earnings,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_game(pollution: [f64; 2], permits: [u32; 2]) -> GameState {
        let mut state = GameState::with_seed(200_000, 5.0, 3);
        state.assign_industries("Industry A", "Industry B");
        for (industry, (p, q)) in state
            .industries
            .iter_mut()
            .zip(pollution.into_iter().zip(permits))
        {
            industry.pollution = p;
            industry.permits = q;
            industry.finished = true;
        }
        state
    }

    #[test]
    fn within_cap_and_compliant_wins() {
        let state = finished_game([90_000.0, 30_000.0], [100_000, 40_000]);
        let outcome = evaluate(&state);
        assert_eq!(outcome.class, OutcomeClass::EveryoneWins);
        assert_eq!(outcome.total_pollution, 120_000.0);
        assert_eq!(outcome.total_permits, 140_000);
        assert_eq!(outcome.excess, 0.0);
    }

    #[test]
    fn within_cap_but_noncompliant_is_partial() {
        let state = finished_game([150_000.0, 30_000.0], [100_000, 40_000]);
        let outcome = evaluate(&state);
        assert_eq!(outcome.class, OutcomeClass::PartialSuccess);
        let deficient = &outcome.industries[0];
        assert!(!deficient.compliant);
        assert_eq!(deficient.deficit, 50_000.0);
        assert!(outcome.industries[1].compliant);
    }

    #[test]
    fn cap_breach_loses_even_when_all_compliant() {
        let state = finished_game([150_000.0, 60_000.0], [160_000, 70_000]);
        let outcome = evaluate(&state);
        assert_eq!(outcome.class, OutcomeClass::EveryoneLoses);
        assert_eq!(outcome.excess, 10_000.0);
        assert!(outcome.industries.iter().all(|i| i.compliant));
    }

    #[test]
    fn pollution_exactly_at_cap_still_wins() {
        let state = finished_game([160_000.0, 40_000.0], [160_000, 40_000]);
        let outcome = evaluate(&state);
        assert_eq!(outcome.class, OutcomeClass::EveryoneWins);
        assert_eq!(outcome.excess, 0.0);
    }
}
