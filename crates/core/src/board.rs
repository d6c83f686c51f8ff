//! The fixed 16-tile game board.

use serde::{Deserialize, Serialize};

/// Number of tiles on the board; positions wrap modulo this count.
pub const TILE_COUNT: usize = 16;

/// Category of an investment offer, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentKind {
    /// Abatement equipment: expensive, large pollution reduction.
    Abatement,
    /// Additional maintenance: cheap, modest pollution reduction.
    Maintenance,
}

impl InvestmentKind {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            InvestmentKind::Abatement => "abatement",
            InvestmentKind::Maintenance => "maintenance",
        }
    }
}

/// What happens to the industry that lands on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Nothing happens (the GO tile).
    NoOp,
    /// Pollution is multiplied by the factor.
    PollutionScale(f64),
    /// Production and pollution grow by the fraction; earnings grow by the
    /// fraction of the pre-effect production value.
    ClientOrderIncrease(f64),
    /// Production and pollution shrink to the multiplier; earnings lose the
    /// cancelled fraction of the pre-effect production value.
    OrderCancel(f64),
    /// A flat charge against earnings.
    FlatCost(f64),
    /// Tax charge: `200 × 0.5 × produce` against earnings.
    Tax,
    /// Two-phase offer: creates a pending decision instead of mutating.
    InvestmentOffer {
        /// Purchase price charged on acceptance.
        cost: f64,
        /// Pollution multiplier applied on acceptance.
        multiplier: f64,
        /// Offer category.
        kind: InvestmentKind,
    },
}

/// One board cell: display text plus the effect applied on landing.
#[derive(Debug, Clone, Copy)]
pub struct TileRule {
    /// Short tile name used in turn narration.
    pub name: &'static str,
    /// Second display line describing the effect.
    pub detail: &'static str,
    /// Effect applied to the industry that lands here.
    pub effect: EffectKind,
}

/// The board, indexed 0 (GO) through 15.
pub const TILES: [TileRule; TILE_COUNT] = [
    TileRule {
        name: "Uniform Auction GO",
        detail: "True-up period",
        effect: EffectKind::NoOp,
    },
    TileRule {
        name: "Unseasonal Rains",
        detail: "Pollution -0.1%",
        effect: EffectKind::PollutionScale(0.999),
    },
    TileRule {
        name: "CEMS Issue",
        detail: "Emissions +20%",
        effect: EffectKind::PollutionScale(1.20),
    },
    TileRule {
        name: "Client Order",
        detail: "Production +30%",
        effect: EffectKind::ClientOrderIncrease(0.30),
    },
    TileRule {
        name: "Abatement",
        detail: "₹20L, -40%",
        effect: EffectKind::InvestmentOffer {
            cost: 2_000_000.0,
            multiplier: 0.6,
            kind: InvestmentKind::Abatement,
        },
    },
    TileRule {
        name: "Advanced Abate",
        detail: "₹40L, -60%",
        effect: EffectKind::InvestmentOffer {
            cost: 4_000_000.0,
            multiplier: 0.4,
            kind: InvestmentKind::Abatement,
        },
    },
    TileRule {
        name: "CEMS Issue",
        detail: "Emissions +10%",
        effect: EffectKind::PollutionScale(1.10),
    },
    TileRule {
        name: "Bird's Nest",
        detail: "Pay ₹5,000",
        effect: EffectKind::FlatCost(5000.0),
    },
    TileRule {
        name: "Client Order",
        detail: "Production +10%",
        effect: EffectKind::ClientOrderIncrease(0.10),
    },
    TileRule {
        name: "Tax Issue",
        detail: "50% at ₹800",
        effect: EffectKind::Tax,
    },
    TileRule {
        name: "CEMS Issue",
        detail: "Emissions +30%",
        effect: EffectKind::PollutionScale(1.30),
    },
    TileRule {
        name: "Hire Additional Maintenance",
        detail: "₹1L, -10%",
        effect: EffectKind::InvestmentOffer {
            cost: 100_000.0,
            multiplier: 0.9,
            kind: InvestmentKind::Maintenance,
        },
    },
    TileRule {
        name: "Hire Additional Maintenance Staff",
        detail: "₹1.5L, -15%",
        effect: EffectKind::InvestmentOffer {
            cost: 150_000.0,
            multiplier: 0.85,
            kind: InvestmentKind::Maintenance,
        },
    },
    TileRule {
        name: "Client Order Cancel",
        detail: "-5%",
        effect: EffectKind::OrderCancel(0.95),
    },
    TileRule {
        name: "CEMS Data Quality Issue",
        detail: "Imputation, +10%",
        effect: EffectKind::PollutionScale(1.10),
    },
    TileRule {
        name: "Client Order Cancel",
        detail: "-5%",
        effect: EffectKind::OrderCancel(0.95),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_sixteen_tiles_and_starts_at_go() {
        assert_eq!(TILES.len(), TILE_COUNT);
        assert_eq!(TILES[0].effect, EffectKind::NoOp);
    }

    #[test]
    fn investment_tiles_match_the_board() {
        let offers: Vec<usize> = TILES
            .iter()
            .enumerate()
            .filter(|(_, tile)| matches!(tile.effect, EffectKind::InvestmentOffer { .. }))
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(offers, vec![4, 5, 11, 12]);
    }

    #[test]
    fn pollution_scale_factors_match_the_board() {
        assert_eq!(TILES[1].effect, EffectKind::PollutionScale(0.999));
        assert_eq!(TILES[2].effect, EffectKind::PollutionScale(1.20));
        assert_eq!(TILES[10].effect, EffectKind::PollutionScale(1.30));
        assert_eq!(TILES[14].effect, EffectKind::PollutionScale(1.10));
    }
}
