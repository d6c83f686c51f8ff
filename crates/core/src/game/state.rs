//! The mutable game state and every operation that advances it.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    board::{EffectKind, InvestmentKind, TILES, TILE_COUNT},
    error::EngineError,
    models::{rint, rint_u32, Industry, SizeClass, MARKET_ALLOCATION, PRODUCE_PRICE},
};

use super::outcome::{evaluate, GameOutcome};

/// Lifecycle of a game. `InProgress` has the sub-state "awaiting an
/// investment decision" whenever a pending investment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Industries may be assigned; no rolls permitted.
    NotStarted,
    /// Turns alternate until both industries finish their lap.
    InProgress,
    /// Terminal; the outcome evaluator applies.
    Over,
}

/// An offered, not-yet-resolved equipment purchase. At most one exists at a
/// time; it blocks further rolls until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingInvestment {
    /// Index of the industry the offer was made to.
    pub industry: usize,
    /// Purchase price.
    pub cost: f64,
    /// Pollution multiplier applied on acceptance.
    pub multiplier: f64,
    /// Offer category.
    pub kind: InvestmentKind,
}

impl PendingInvestment {
    /// Pollution reduction as a whole percentage, for display.
    pub fn reduction_pct(&self) -> u32 {
        ((1.0 - self.multiplier) * 100.0).round() as u32
    }
}

/// Permit market bookkeeping, configured once per game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Total pollution ceiling for the whole game, in kg.
    pub market_cap: u32,
    /// Floor price per permit.
    pub permit_price: f64,
    /// Tradable permits left in the market reserve. Monotonically
    /// non-increasing after setup.
    pub permits_remaining: u32,
}

/// Report returned from a completed roll, for the frontend status line.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Name of the industry that rolled.
    pub industry: String,
    /// The die value.
    pub roll: u8,
    /// Tile landed on.
    pub tile_index: usize,
    /// Name of the tile landed on.
    pub tile_name: &'static str,
    /// Whether this move completed the industry's lap.
    pub completed_lap: bool,
    /// Whether this move ended the game.
    pub game_over: bool,
    /// Whether the landing created an investment decision.
    pub offer: bool,
}

/// Result of resolving a pending investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestmentOutcome {
    /// Equipment bought; pollution reduced by `reduction_pct` percent.
    Purchased {
        /// Offer category.
        kind: InvestmentKind,
        /// Pollution reduction as a whole percentage.
        reduction_pct: u32,
    },
    /// Offer skipped; nothing changed.
    Declined,
}

/// The aggregate state of one game, owned by the controlling session and
/// mutated one operation at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Exactly two industries once assigned.
    pub industries: Vec<Industry>,
    /// Index of the active industry while the game is in progress.
    pub current_turn: usize,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Value of the most recent die roll.
    pub last_roll: Option<u8>,
    /// Append-only narration of the game so far.
    pub log: Vec<String>,
    /// Unresolved investment offer, if any.
    pub pending_investment: Option<PendingInvestment>,
    /// Permit market bookkeeping.
    pub market: MarketState,
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

impl GameState {
    /// Create an empty game for the given market parameters.
    pub fn new(market_cap: u32, permit_price: f64) -> Self {
        Self::with_rng(market_cap, permit_price, entropy_rng())
    }

    /// Create a game with a deterministic dice sequence.
    pub fn with_seed(market_cap: u32, permit_price: f64, seed: u64) -> Self {
        Self::with_rng(market_cap, permit_price, StdRng::seed_from_u64(seed))
    }

    fn with_rng(market_cap: u32, permit_price: f64, rng: StdRng) -> Self {
        Self {
            industries: Vec::new(),
            current_turn: 0,
            phase: Phase::NotStarted,
            last_roll: None,
            log: Vec::new(),
            pending_investment: None,
            market: MarketState {
                market_cap,
                permit_price,
                permits_remaining: 0,
            },
            rng,
        }
    }

    /// Populate the two industries, randomly deciding which is Large and
    /// which is Small, and seed the market reserve. Discards any game in
    /// progress.
    pub fn assign_industries(&mut self, name_a: &str, name_b: &str) {
        let name_a = non_empty_or(name_a, "Industry A");
        let name_b = non_empty_or(name_b, "Industry B");

        let mut kinds = [SizeClass::Large, SizeClass::Small];
        if self.rng.gen_bool(0.5) {
            kinds.swap(0, 1);
        }

        self.industries = vec![
            Industry::new(name_a, kinds[0], self.market.market_cap),
            Industry::new(name_b, kinds[1], self.market.market_cap),
        ];
        self.current_turn = 0;
        self.phase = Phase::NotStarted;
        self.last_roll = None;
        self.pending_investment = None;
        self.market.permits_remaining =
            rint_u32(f64::from(self.market.market_cap) * MARKET_ALLOCATION);
        self.log = vec![format!(
            "Industries assigned: {}, {}",
            self.industries[0].display_label(),
            self.industries[1].display_label()
        )];
        info!(
            cap = self.market.market_cap,
            reserve = self.market.permits_remaining,
            "industries assigned"
        );
    }

    /// Begin play. Requires both industries to be assigned.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::NotStarted {
            return Err(EngineError::InvalidState("the game has already started"));
        }
        if self.industries.len() != 2 {
            return Err(EngineError::InvalidState(
                "industries have not been assigned",
            ));
        }
        self.phase = Phase::InProgress;
        self.current_turn = 0;
        self.log.push("Game started".to_string());
        info!("game started");
        Ok(())
    }

    /// Discard everything and return to an empty, unstarted game with the
    /// same market parameters.
    pub fn reset(&mut self) {
        self.industries.clear();
        self.current_turn = 0;
        self.phase = Phase::NotStarted;
        self.last_roll = None;
        self.log.clear();
        self.pending_investment = None;
        self.market.permits_remaining = 0;
    }

    /// The industry whose turn it is, once industries are assigned.
    pub fn current_industry(&self) -> Option<&Industry> {
        self.industries.get(self.current_turn)
    }

    /// Roll the die for the active industry, move it, and apply the landed
    /// tile's effect. Fails without mutation while a decision is pending,
    /// before the game starts, or after it is over.
    pub fn roll_and_move(&mut self) -> Result<TurnReport, EngineError> {
        self.ensure_can_roll()?;
        let roll: u8 = self.rng.gen_range(1..=6);
        self.advance(roll)
    }

    fn ensure_can_roll(&self) -> Result<(), EngineError> {
        match self.phase {
            Phase::NotStarted => Err(EngineError::InvalidState("the game has not started")),
            Phase::Over => Err(EngineError::InvalidState("the game is over")),
            Phase::InProgress => {
                if self.pending_investment.is_some() {
                    Err(EngineError::InvalidState(
                        "an investment decision is pending",
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Move the active industry by a known roll. Split out from
    /// [`Self::roll_and_move`] so the turn algorithm is testable with a
    /// chosen die value.
    fn advance(&mut self, roll: u8) -> Result<TurnReport, EngineError> {
        self.ensure_can_roll()?;
        let idx = self.current_turn;
        self.last_roll = Some(roll);

        let industry = &mut self.industries[idx];
        let old_position = industry.position;
        industry.position = (old_position + roll as usize) % TILE_COUNT;
        let tile_index = industry.position;
        let name = industry.name.clone();

        let tile = &TILES[tile_index];
        self.apply_effect(idx, tile.effect);

        let industry = &mut self.industries[idx];
        industry.produce = rint(industry.produce);
        industry.pollution = rint(industry.pollution);

        self.log
            .push(format!("{name} rolled {roll} and moved to {}", tile.name));
        debug!(industry = %name, roll, tile = tile.name, "turn taken");

        let completed_lap = old_position != 0 && tile_index == 0;
        if completed_lap {
            self.industries[idx].finished = true;
            self.log.push(format!("{name} completed the circuit!"));
            if self.industries.iter().all(|industry| industry.finished) {
                self.phase = Phase::Over;
                self.log.push("All industries finished. True-up time!".to_string());
                info!("game over");
            }
        }

        if self.phase == Phase::InProgress {
            self.current_turn = (self.current_turn + 1) % self.industries.len();
        }

        Ok(TurnReport {
            industry: name,
            roll,
            tile_index,
            tile_name: tile.name,
            completed_lap,
            game_over: self.phase == Phase::Over,
            offer: self.pending_investment.is_some(),
        })
    }

    fn apply_effect(&mut self, idx: usize, effect: EffectKind) {
        match effect {
            EffectKind::NoOp => {}
            EffectKind::PollutionScale(factor) => {
                self.industries[idx].pollution *= factor;
            }
            EffectKind::ClientOrderIncrease(pct) => {
                let industry = &mut self.industries[idx];
                let pre = industry.produce;
                industry.produce *= 1.0 + pct;
                industry.pollution *= 1.0 + pct;
                industry.earnings += pct * pre * PRODUCE_PRICE;
            }
            EffectKind::OrderCancel(multiplier) => {
                let industry = &mut self.industries[idx];
                let pre = industry.produce;
                industry.produce *= multiplier;
                industry.pollution *= multiplier;
                industry.earnings -= (1.0 - multiplier) * pre * PRODUCE_PRICE;
            }
            EffectKind::FlatCost(cost) => {
                let industry = &mut self.industries[idx];
                industry.earnings -= cost;
                industry.total_cost += cost;
            }
            EffectKind::Tax => {
                let industry = &mut self.industries[idx];
                let loss = 200.0 * 0.5 * industry.produce;
                industry.earnings -= loss;
                industry.total_cost += loss;
            }
            EffectKind::InvestmentOffer {
                cost,
                multiplier,
                kind,
            } => {
                self.pending_investment = Some(PendingInvestment {
                    industry: idx,
                    cost,
                    multiplier,
                    kind,
                });
            }
        }
    }

    /// Resolve the pending investment offer. The offer is cleared on every
    /// branch, unblocking the next roll; only acceptance with adequate
    /// funds mutates the industry.
    pub fn resolve_investment(
        &mut self,
        accept: bool,
    ) -> Result<InvestmentOutcome, EngineError> {
        let pending = self
            .pending_investment
            .take()
            .ok_or(EngineError::InvalidState("no investment decision is pending"))?;

        let industry = &mut self.industries[pending.industry];
        if !accept {
            self.log
                .push(format!("{} skipped the {} offer", industry.name, pending.kind.label()));
            return Ok(InvestmentOutcome::Declined);
        }

        if industry.earnings < pending.cost {
            warn!(
                industry = %industry.name,
                needed = pending.cost,
                available = industry.earnings,
                "investment declined for lack of funds"
            );
            self.log.push(format!(
                "{} could not afford the {} equipment",
                industry.name,
                pending.kind.label()
            ));
            return Err(EngineError::InsufficientFunds {
                needed: pending.cost,
                available: industry.earnings,
            });
        }

        industry.earnings -= pending.cost;
        industry.total_cost += pending.cost;
        industry.pollution *= pending.multiplier;
        self.log.push(format!(
            "{} bought {} equipment, pollution -{}%",
            industry.name,
            pending.kind.label(),
            pending.reduction_pct()
        ));
        Ok(InvestmentOutcome::Purchased {
            kind: pending.kind,
            reduction_pct: pending.reduction_pct(),
        })
    }

    /// Largest quantity the industry could buy right now at the given unit
    /// price, considering the market reserve, its holding ceiling, and its
    /// funds. Frontends clamp their input widgets to this; the engine still
    /// rejects out-of-range requests.
    pub fn max_purchasable(&self, industry: usize, unit_price: f64) -> u32 {
        let Some(industry) = self.industries.get(industry) else {
            return 0;
        };
        let headroom = industry.max_permits.saturating_sub(industry.permits);
        let affordable = if unit_price > 0.0 {
            (industry.earnings / unit_price).floor().max(0.0) as u32
        } else {
            0
        };
        self.market
            .permits_remaining
            .min(headroom)
            .min(affordable)
    }

    /// Buy permits from the market reserve for one industry. Every
    /// constraint violation is rejected with [`EngineError::InvalidTrade`]
    /// and no mutation; quantities are never silently clamped. Returns the
    /// total cost charged.
    pub fn buy_permits(
        &mut self,
        industry: usize,
        quantity: u32,
        unit_price: f64,
    ) -> Result<f64, EngineError> {
        let Some(buyer) = self.industries.get(industry) else {
            return Err(EngineError::InvalidTrade(format!(
                "no industry at index {industry}"
            )));
        };

        if quantity > self.market.permits_remaining {
            return Err(EngineError::InvalidTrade(format!(
                "only {} permits remain in the market",
                self.market.permits_remaining
            )));
        }
        let headroom = buyer.max_permits.saturating_sub(buyer.permits);
        if quantity > headroom {
            return Err(EngineError::InvalidTrade(format!(
                "{} may hold at most {} more permits",
                buyer.name, headroom
            )));
        }
        let cost = f64::from(quantity) * unit_price;
        if cost > buyer.earnings {
            return Err(EngineError::InvalidTrade(format!(
                "{} cannot afford ₹{cost:.0} for {quantity} permits",
                buyer.name
            )));
        }

        let buyer = &mut self.industries[industry];
        buyer.earnings -= cost;
        buyer.permit_cost += cost;
        buyer.total_cost += cost;
        buyer.permits += quantity;
        self.market.permits_remaining -= quantity;
        self.log.push(format!(
            "{} bought {} permits for ₹{:.0}",
            buyer.name, quantity, cost
        ));
        debug!(industry = %buyer.name, quantity, cost, "permits bought");
        Ok(cost)
    }

    /// The final classification, once the game is over.
    pub fn outcome(&self) -> Option<GameOutcome> {
        (self.phase == Phase::Over).then(|| evaluate(self))
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::OutcomeClass;

    fn started_game() -> GameState {
        let mut state = GameState::with_seed(200_000, 5.0, 7);
        state.assign_industries("Industry A", "Industry B");
        state.start().expect("start");
        state
    }

    /// Force a known size order so effect arithmetic is predictable.
    fn started_large_first() -> GameState {
        let mut state = started_game();
        if state.industries[0].size_class != SizeClass::Large {
            state.industries.swap(0, 1);
        }
        state
    }

    #[test]
    fn assignment_seeds_market_reserve() {
        let mut state = GameState::with_seed(200_000, 5.0, 1);
        state.assign_industries("Industry A", "Industry B");
        assert_eq!(state.market.permits_remaining, 40_000);
        assert_eq!(state.industries.len(), 2);
        let classes: Vec<SizeClass> =
            state.industries.iter().map(|i| i.size_class).collect();
        assert!(classes.contains(&SizeClass::Large));
        assert!(classes.contains(&SizeClass::Small));
    }

    #[test]
    fn blank_names_fall_back_to_defaults() {
        let mut state = GameState::with_seed(200_000, 5.0, 1);
        state.assign_industries("  ", "");
        assert_eq!(state.industries[0].name, "Industry A");
        assert_eq!(state.industries[1].name, "Industry B");
    }

    #[test]
    fn rolling_before_start_is_rejected() {
        let mut state = GameState::with_seed(200_000, 5.0, 1);
        state.assign_industries("A", "B");
        let err = state.roll_and_move().unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert!(state.last_roll.is_none());
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut state = started_game();
        assert!(matches!(
            state.start(),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn roll_moves_and_alternates_turns() {
        let mut state = started_game();
        let report = state.roll_and_move().expect("roll");
        assert!((1..=6).contains(&report.roll));
        assert_eq!(state.industries[0].position, report.roll as usize);
        assert_eq!(state.last_roll, Some(report.roll));
        assert_eq!(state.current_turn, 1);
        assert!(!state.log.is_empty());
    }

    #[test]
    fn client_order_tile_scales_output_and_earnings() {
        let mut state = started_large_first();
        let before = state.industries[0].clone();
        state.advance(3).expect("advance to tile 3");
        let after = &state.industries[0];
        assert_eq!(after.produce, (before.produce * 1.3).round());
        assert_eq!(after.pollution, (before.pollution * 1.3).round());
        assert_eq!(
            after.earnings,
            before.earnings + 0.30 * before.produce * PRODUCE_PRICE
        );
    }

    #[test]
    fn tax_tile_charges_half_produce_at_800() {
        let mut state = started_large_first();
        // Park at tile 3 without applying its effect, then roll a 6 to 9.
        state.industries[0].position = 3;
        let before = state.industries[0].clone();
        state.advance(6).expect("advance to tile 9");
        let after = &state.industries[0];
        let loss = 200.0 * 0.5 * before.produce;
        assert_eq!(after.earnings, before.earnings - loss);
        assert_eq!(after.total_cost, before.total_cost + loss);
    }

    #[test]
    fn order_cancel_tile_shrinks_output_and_earnings() {
        let mut state = started_large_first();
        state.industries[0].position = 9;
        let before = state.industries[0].clone();
        state.advance(4).expect("advance to tile 13");
        let after = &state.industries[0];
        assert_eq!(after.produce, (before.produce * 0.95).round());
        assert_eq!(
            after.earnings,
            before.earnings - 0.05 * before.produce * PRODUCE_PRICE
        );
    }

    #[test]
    fn investment_tile_defers_and_blocks_rolling() {
        let mut state = started_large_first();
        let before = state.industries[0].clone();
        let report = state.advance(4).expect("advance to tile 4");
        assert!(report.offer);
        let pending = state.pending_investment.expect("pending offer");
        assert_eq!(pending.industry, 0);
        assert_eq!(pending.cost, 2_000_000.0);
        assert_eq!(pending.multiplier, 0.6);
        // No immediate mutation beyond the move itself.
        assert_eq!(state.industries[0].pollution, before.pollution);
        assert_eq!(state.industries[0].earnings, before.earnings);
        // Turn index still advanced; rolling is what's blocked.
        assert_eq!(state.current_turn, 1);
        assert!(matches!(
            state.roll_and_move(),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn accepted_investment_charges_and_reduces_pollution() {
        let mut state = started_large_first();
        state.advance(4).expect("advance to tile 4");
        let before = state.industries[0].clone();
        let outcome = state.resolve_investment(true).expect("accept");
        assert_eq!(
            outcome,
            InvestmentOutcome::Purchased {
                kind: InvestmentKind::Abatement,
                reduction_pct: 40
            }
        );
        let after = &state.industries[0];
        assert_eq!(after.earnings, before.earnings - 2_000_000.0);
        assert_eq!(after.total_cost, before.total_cost + 2_000_000.0);
        assert_eq!(after.pollution, before.pollution * 0.6);
        assert!(state.pending_investment.is_none());
    }

    #[test]
    fn declined_investment_clears_without_mutation() {
        let mut state = started_large_first();
        state.advance(4).expect("advance to tile 4");
        let before = state.industries[0].clone();
        let outcome = state.resolve_investment(false).expect("decline");
        assert_eq!(outcome, InvestmentOutcome::Declined);
        let after = &state.industries[0];
        assert_eq!(after.earnings, before.earnings);
        assert_eq!(after.pollution, before.pollution);
        assert!(state.pending_investment.is_none());
        // The next roll is unblocked.
        state.roll_and_move().expect("roll after decline");
    }

    #[test]
    fn underfunded_acceptance_clears_offer_without_mutation() {
        let mut state = started_large_first();
        state.industries[0].earnings = 1_500_000.0;
        state.advance(4).expect("advance to tile 4");
        let before = state.industries[0].clone();
        let err = state.resolve_investment(true).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientFunds {
                needed: 2_000_000.0,
                available: 1_500_000.0
            }
        );
        let after = &state.industries[0];
        assert_eq!(after.earnings, before.earnings);
        assert_eq!(after.pollution, before.pollution);
        assert!(state.pending_investment.is_none());
    }

    #[test]
    fn resolving_without_an_offer_is_rejected() {
        let mut state = started_game();
        assert!(matches!(
            state.resolve_investment(true),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn lap_completion_finishes_industry_and_ends_game() {
        let mut state = started_game();
        // Walk A back onto GO from tile 14.
        state.industries[0].position = 14;
        let report = state.advance(2).expect("advance A to GO");
        assert!(report.completed_lap);
        assert!(state.industries[0].finished);
        assert!(!report.game_over);
        assert_eq!(state.phase, Phase::InProgress);

        // B still has to finish; turns keep alternating.
        assert_eq!(state.current_turn, 1);
        state.industries[1].position = 13;
        let report = state.advance(3).expect("advance B to GO");
        assert!(report.completed_lap);
        assert!(report.game_over);
        assert_eq!(state.phase, Phase::Over);

        // No more rolls once over.
        assert!(matches!(
            state.roll_and_move(),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn landing_on_go_by_wrapping_only_counts_after_leaving() {
        let mut state = started_game();
        // position 0 → 0 cannot happen from a 1..=6 roll, but a wrap from
        // tile 10 with roll 6 lands on 0 and must finish the lap.
        state.industries[0].position = 10;
        let report = state.advance(6).expect("wrap to GO");
        assert!(report.completed_lap);
    }

    #[test]
    fn buy_permits_happy_path() {
        let mut state = started_game();
        let before = state.industries[0].clone();
        let reserve = state.market.permits_remaining;
        let cost = state.buy_permits(0, 100, 5.0).expect("buy");
        assert_eq!(cost, 500.0);
        let after = &state.industries[0];
        assert_eq!(after.permits, before.permits + 100);
        assert_eq!(after.earnings, before.earnings - 500.0);
        assert_eq!(after.permit_cost, before.permit_cost + 500.0);
        assert_eq!(after.total_cost, before.total_cost + 500.0);
        assert_eq!(state.market.permits_remaining, reserve - 100);
    }

    #[test]
    fn buy_permits_rejects_market_exhaustion() {
        let mut state = started_game();
        state.market.permits_remaining = 10;
        let err = state.buy_permits(0, 11, 5.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTrade(_)));
        assert_eq!(state.market.permits_remaining, 10);
    }

    #[test]
    fn buy_permits_rejects_holding_ceiling() {
        let mut state = started_game();
        let headroom =
            state.industries[0].max_permits - state.industries[0].permits;
        let err = state.buy_permits(0, headroom + 1, 5.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTrade(_)));
        assert_eq!(
            state.industries[0].permits,
            state.industries[0].initial_permits
        );
    }

    #[test]
    fn buy_permits_rejects_unaffordable_cost() {
        let mut state = started_game();
        state.industries[0].earnings = 40.0;
        let err = state.buy_permits(0, 10, 5.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTrade(_)));
        assert_eq!(state.industries[0].earnings, 40.0);

        // Exactly affordable is fine and cannot go negative.
        state.buy_permits(0, 8, 5.0).expect("exact funds");
        assert_eq!(state.industries[0].earnings, 0.0);
    }

    #[test]
    fn max_purchasable_is_the_binding_minimum() {
        let mut state = started_game();
        state.market.permits_remaining = 50;
        state.industries[0].earnings = 1_000.0;
        // reserve 50 vs headroom (large) vs affordable 200 → 50.
        assert_eq!(state.max_purchasable(0, 5.0), 50);
        state.industries[0].earnings = 20.0;
        assert_eq!(state.max_purchasable(0, 5.0), 4);
        assert_eq!(state.max_purchasable(0, 0.0), 0);
        assert_eq!(state.max_purchasable(9, 5.0), 0);
    }

    #[test]
    fn outcome_only_available_when_over() {
        let mut state = started_game();
        assert!(state.outcome().is_none());
        state.industries[0].position = 14;
        state.advance(2).expect("A finishes");
        state.industries[1].position = 14;
        state.advance(2).expect("B finishes");
        let outcome = state.outcome().expect("outcome");
        // 200k cap: base pollution mutated by two tile-15 landings... just
        // check classification consistency here; exact classes are covered
        // in outcome tests.
        assert_eq!(outcome.market_cap, 200_000);
    }

    #[test]
    fn cap_breach_loses_regardless_of_compliance() {
        let mut state = started_game();
        state.industries[0].position = 14;
        state.advance(2).expect("A finishes");
        state.industries[1].position = 14;
        state.advance(2).expect("B finishes");
        state.industries[0].pollution = 150_000.0;
        state.industries[1].pollution = 60_000.0;
        let outcome = state.outcome().expect("outcome");
        assert_eq!(outcome.total_pollution, 210_000.0);
        assert_eq!(outcome.class, OutcomeClass::EveryoneLoses);
    }

    #[test]
    fn reset_returns_to_empty_not_started() {
        let mut state = started_game();
        state.roll_and_move().expect("roll");
        state.reset();
        assert!(state.industries.is_empty());
        assert_eq!(state.phase, Phase::NotStarted);
        assert!(state.log.is_empty());
        assert!(state.last_roll.is_none());
        assert_eq!(state.market.permits_remaining, 0);
        assert_eq!(state.market.market_cap, 200_000);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut state = started_game();
        state.roll_and_move().expect("roll");
        let json = serde_json::to_string(&state).expect("serialize");
        let restored: GameState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.phase, state.phase);
        assert_eq!(restored.current_turn, state.current_turn);
        assert_eq!(restored.log, state.log);
        assert_eq!(
            restored.industries[0].permits,
            state.industries[0].permits
        );
    }
}
