//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Price earned per unit of production, in rupees.
pub const PRODUCE_PRICE: f64 = 1000.0;
/// Share of the market cap allocated directly to industries at setup.
pub const INDUSTRY_ALLOCATION: f64 = 0.80;
/// Share of the market cap held back as the tradable market reserve.
pub const MARKET_ALLOCATION: f64 = 0.20;
/// Permit holding ceiling relative to the initial allocation.
pub const MAX_PERMIT_HOLDING: f64 = 1.50;

/// Fixed size class of an industry, assigned once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    /// Large emitter: 10 000 units of production, 100 000 kg of pollution.
    Large,
    /// Small emitter: 2 000 units of production, 20 000 kg of pollution.
    Small,
}

impl SizeClass {
    /// Base production output for the class.
    pub fn base_produce(self) -> f64 {
        match self {
            SizeClass::Large => 10_000.0,
            SizeClass::Small => 2_000.0,
        }
    }

    /// Base annual pollution for the class, in kg.
    pub fn base_pollution(self) -> f64 {
        match self {
            SizeClass::Large => 100_000.0,
            SizeClass::Small => 20_000.0,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            SizeClass::Large => "Large",
            SizeClass::Small => "Small",
        }
    }
}

/// One game participant: a firm with production and pollution attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Industry {
    /// Display name, unique per game.
    pub name: String,
    /// Size class fixed at creation.
    pub size_class: SizeClass,
    /// Current production output.
    pub produce: f64,
    /// Current emissions, in kg.
    pub pollution: f64,
    /// Permits granted at setup.
    pub initial_permits: u32,
    /// Permits currently held; never exceeds `max_permits`.
    pub permits: u32,
    /// Holding ceiling: 150% of the initial allocation.
    pub max_permits: u32,
    /// Revenue at setup (`produce × 1000`).
    pub revenue: f64,
    /// Running funds; trades and investments are rejected before this
    /// could be driven negative.
    pub earnings: f64,
    /// Cumulative costs paid over the game.
    pub total_cost: f64,
    /// Portion of `total_cost` spent on permits.
    pub permit_cost: f64,
    /// Current board tile index.
    pub position: usize,
    /// Set once the industry returns to tile 0 after leaving it.
    pub finished: bool,
}

impl Industry {
    /// Create an industry with its initial allocation for the given market
    /// cap. Two players is the only supported configuration, so the
    /// pollution share is always taken against the Large + Small base sum.
    pub fn new(name: impl Into<String>, size_class: SizeClass, market_cap: u32) -> Self {
        let produce = size_class.base_produce();
        let pollution = size_class.base_pollution();

        let base_total = SizeClass::Large.base_pollution() + SizeClass::Small.base_pollution();
        let share = pollution / base_total;
        let industry_allocation = f64::from(market_cap) * INDUSTRY_ALLOCATION;

        let initial_permits = rint_u32(industry_allocation * share);
        let max_permits = rint_u32(f64::from(initial_permits) * MAX_PERMIT_HOLDING);
        let revenue = produce * PRODUCE_PRICE;

        Self {
            name: name.into(),
            size_class,
            produce,
            pollution,
            initial_permits,
            permits: initial_permits,
            max_permits,
            revenue,
            earnings: revenue,
            total_cost: 0.0,
            permit_cost: 0.0,
            position: 0,
            finished: false,
        }
    }

    /// Whether held permits cover current pollution.
    pub fn is_compliant(&self) -> bool {
        self.pollution <= f64::from(self.permits)
    }

    /// Pollution not covered by permits, in kg; zero when compliant.
    pub fn deficit(&self) -> f64 {
        (self.pollution - f64::from(self.permits)).max(0.0)
    }

    /// User-facing label combining name and size class.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.size_class.label())
    }
}

/// Round to the nearest integer, keeping the float representation.
pub(crate) fn rint(x: f64) -> f64 {
    x.round()
}

pub(crate) fn rint_u32(x: f64) -> u32 {
    x.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_industry_allocation_at_default_cap() {
        let industry = Industry::new("Industry A", SizeClass::Large, 200_000);
        // round(200000 × 0.8 × 100000 / 120000)
        assert_eq!(industry.initial_permits, 133_333);
        assert_eq!(industry.permits, 133_333);
        assert_eq!(industry.max_permits, 200_000);
        assert_eq!(industry.revenue, 10_000_000.0);
        assert_eq!(industry.earnings, 10_000_000.0);
        assert_eq!(industry.position, 0);
        assert!(!industry.finished);
    }

    #[test]
    fn small_industry_allocation_at_default_cap() {
        let industry = Industry::new("Industry B", SizeClass::Small, 200_000);
        assert_eq!(industry.initial_permits, 26_667);
        assert_eq!(industry.max_permits, 40_001);
    }

    #[test]
    fn allocations_sum_to_industry_share_of_cap() {
        for cap in (100_000..=500_000u32).step_by(10_000) {
            let large = Industry::new("L", SizeClass::Large, cap);
            let small = Industry::new("S", SizeClass::Small, cap);
            let expected = (f64::from(cap) * INDUSTRY_ALLOCATION).round() as i64;
            let sum = i64::from(large.initial_permits) + i64::from(small.initial_permits);
            // Each industry rounds independently, so allow 1 unit apiece.
            assert!(
                (sum - expected).abs() <= 2,
                "cap {cap}: sum {sum} vs expected {expected}"
            );
        }
    }

    #[test]
    fn max_permits_is_150_percent_of_initial() {
        for cap in [100_000, 230_000, 500_000] {
            for size in [SizeClass::Large, SizeClass::Small] {
                let industry = Industry::new("X", size, cap);
                let expected = (f64::from(industry.initial_permits) * 1.5).round() as u32;
                assert_eq!(industry.max_permits, expected);
            }
        }
    }

    #[test]
    fn compliance_and_deficit() {
        let mut industry = Industry::new("X", SizeClass::Small, 200_000);
        industry.pollution = f64::from(industry.permits);
        assert!(industry.is_compliant());
        assert_eq!(industry.deficit(), 0.0);

        industry.pollution += 500.0;
        assert!(!industry.is_compliant());
        assert_eq!(industry.deficit(), 500.0);
    }
}
