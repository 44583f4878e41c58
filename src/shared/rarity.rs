//! Rarity tiers derived from a monster's total stats.

use crate::shared::monster::{Monster, Stats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered rarity tiers, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Lower bound (inclusive) of each tier above common, highest first
const THRESHOLDS: [(u64, Rarity); 4] = [
    (600, Rarity::Legendary),
    (500, Rarity::Epic),
    (400, Rarity::Rare),
    (300, Rarity::Uncommon),
];

/// Display metadata of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub border_color: &'static str,
}

impl Rarity {
    /// Tier for a stat sum
    pub fn from_total(total: u64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| total >= *min)
            .map(|(_, rarity)| *rarity)
            .unwrap_or(Rarity::Common)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn style(&self) -> RarityStyle {
        match self {
            Rarity::Common => RarityStyle { label: "Common", color: "#9ca3af", border_color: "#6b7280" },
            Rarity::Uncommon => RarityStyle { label: "Uncommon", color: "#10b981", border_color: "#059669" },
            Rarity::Rare => RarityStyle { label: "Rare", color: "#3b82f6", border_color: "#2563eb" },
            Rarity::Epic => RarityStyle { label: "Epic", color: "#a855f7", border_color: "#9333ea" },
            Rarity::Legendary => RarityStyle { label: "Legendary", color: "#f59e0b", border_color: "#d97706" },
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rarity of a set of stats
pub fn rarity_of(stats: &Stats) -> Rarity {
    Rarity::from_total(stats.total())
}

/// Rarity of a monster. Never fails.
pub fn calculate_rarity(monster: &Monster) -> Rarity {
    rarity_of(&monster.stats)
}
