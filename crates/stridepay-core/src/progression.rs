//! Tier progression state machine.
//!
//! Tracks cumulative steps within the active tier and advances the
//! tier when the requirement is met. The machine is caller-driven:
//! each call applies a step delta to the authoritative persisted state
//! and reports what happened. An advancement fires exactly once per
//! threshold crossing because the counter resets as part of the same
//! transition.
//!
//! ## State Transitions
//!
//! ```text
//! tier k --(steps_in_tier >= requirement(k), k < N)--> tier k+1
//! tier N --(any steps)--> tier N (terminal; steps accrue at N's rate)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::tiers::TierTable;

/// What to do with steps in excess of a tier's requirement when
/// advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CarryPolicy {
    /// Reset the in-tier counter to 0, discarding the excess.
    #[default]
    Discard,
    /// Carry the excess into the next tier's counter.
    CarryOver,
}

/// Per-user tier progression state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProgress {
    pub user_id: String,
    pub tier_ordinal: u32,
    pub steps_in_tier: u64,
}

impl TierProgress {
    /// Fresh state at tier 1 with no accumulated steps.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tier_ordinal: 1,
            steps_in_tier: 0,
        }
    }

    /// Completion fraction within the current tier, 0.0 .. 1.0.
    ///
    /// The terminal tier reports the fraction against its own
    /// requirement, capped at 1.0.
    pub fn completion(&self, table: &TierTable) -> f64 {
        let Some(tier) = table.get(self.tier_ordinal) else {
            return 0.0;
        };
        (self.steps_in_tier as f64 / tier.step_requirement as f64).min(1.0)
    }

    /// Apply a step delta, advancing tiers as thresholds are met.
    ///
    /// Returns the events produced: quarter milestones crossed within
    /// the (original) tier, then one `TierAdvanced` per advancement.
    /// The terminal tier never advances; its counter keeps growing so
    /// excess steps accrue there indefinitely.
    pub fn apply_steps(&mut self, table: &TierTable, added_steps: u64, policy: CarryPolicy) -> Vec<Event> {
        let mut events = Vec::new();
        if added_steps == 0 {
            return events;
        }

        let before = self.completion(table);
        self.steps_in_tier = self.steps_in_tier.saturating_add(added_steps);
        let after = self.completion(table);

        for (quarter, threshold) in [(25u8, 0.25), (50, 0.50), (75, 0.75)] {
            if before < threshold && after >= threshold {
                events.push(Event::QuarterMilestone {
                    tier: self.tier_ordinal,
                    quarter,
                    at: Utc::now(),
                });
            }
        }

        loop {
            let Some(tier) = table.get(self.tier_ordinal) else {
                break;
            };
            if self.steps_in_tier < tier.step_requirement || table.is_terminal(self.tier_ordinal) {
                break;
            }
            self.steps_in_tier = match policy {
                CarryPolicy::Discard => 0,
                CarryPolicy::CarryOver => self.steps_in_tier - tier.step_requirement,
            };
            self.tier_ordinal += 1;
            let new_tier = table
                .get(self.tier_ordinal)
                .expect("advancement is bounded by the terminal ordinal");
            events.push(Event::TierAdvanced {
                new_tier: new_tier.ordinal,
                label: new_tier.label.clone(),
                base_rate: new_tier.base_rate,
                at: Utc::now(),
            });
        }

        events
    }
}
