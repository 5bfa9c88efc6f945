//! Tier definitions and the static tier table.
//!
//! A tier is a discrete earning-rate bracket. Users progress through
//! tiers by accumulating steps; the last tier is terminal and absorbs
//! all further steps at its rate.

use serde::{Deserialize, Serialize};

/// Number of steps per earning block. Partial blocks earn nothing.
pub const STEPS_PER_BLOCK: u64 = 25;

/// A single earning-rate bracket.
///
/// `base_rate` is expressed in currency subunits per completed
/// 25-step block and may be fractional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDefinition {
    /// 1-based position in the tier order.
    pub ordinal: u32,
    /// Currency subunits earned per completed step block.
    pub base_rate: f64,
    /// Cumulative in-tier steps required to advance to the next tier.
    pub step_requirement: u64,
    pub label: String,
}

/// Ordered, immutable list of tier definitions.
///
/// Ordinals are contiguous starting at 1; the highest ordinal is the
/// terminal tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierTable {
    tiers: Vec<TierDefinition>,
}

impl TierTable {
    /// Build a table from an ordered list of definitions.
    ///
    /// Returns `None` if the list is empty or ordinals are not the
    /// contiguous sequence 1..=len.
    pub fn new(tiers: Vec<TierDefinition>) -> Option<Self> {
        if tiers.is_empty() {
            return None;
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tier.ordinal != (i + 1) as u32 || tier.step_requirement == 0 {
                return None;
            }
        }
        Some(Self { tiers })
    }

    /// The tier for a given ordinal, if it exists.
    pub fn get(&self, ordinal: u32) -> Option<&TierDefinition> {
        if ordinal == 0 {
            return None;
        }
        self.tiers.get((ordinal - 1) as usize)
    }

    /// Ordinal of the terminal tier.
    pub fn terminal_ordinal(&self) -> u32 {
        self.tiers.len() as u32
    }

    pub fn is_terminal(&self, ordinal: u32) -> bool {
        ordinal >= self.terminal_ordinal()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter()
    }
}

impl Default for TierTable {
    /// The standard five-tier schedule.
    fn default() -> Self {
        let tiers = vec![
            TierDefinition {
                ordinal: 1,
                base_rate: 1.0,
                step_requirement: 50_000,
                label: "Stroller".to_string(),
            },
            TierDefinition {
                ordinal: 2,
                base_rate: 1.2,
                step_requirement: 100_000,
                label: "Walker".to_string(),
            },
            TierDefinition {
                ordinal: 3,
                base_rate: 1.5,
                step_requirement: 200_000,
                label: "Jogger".to_string(),
            },
            TierDefinition {
                ordinal: 4,
                base_rate: 2.0,
                step_requirement: 350_000,
                label: "Runner".to_string(),
            },
            TierDefinition {
                ordinal: 5,
                base_rate: 2.5,
                step_requirement: 500_000,
                label: "Marathoner".to_string(),
            },
        ];
        Self { tiers }
    }
}
