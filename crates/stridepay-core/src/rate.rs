//! Step-to-currency conversion.
//!
//! Pure functions only: no I/O, no side effects, deterministic for
//! identical inputs. Steps are quantized into 25-step blocks first;
//! the block count is multiplied by the (possibly fractional)
//! effective rate and floored once at the end, so rounding error never
//! compounds.

use crate::tiers::STEPS_PER_BLOCK;

/// Completed earning blocks for a step count. Partial blocks earn
/// nothing until completed.
pub fn blocks(steps: u64) -> u64 {
    steps / STEPS_PER_BLOCK
}

/// Effective rate: the tier's base rate scaled by the combined bonus
/// factor.
pub fn effective_rate(base_rate: f64, bonus_factor: f64) -> f64 {
    base_rate * bonus_factor
}

/// Currency subunits pending for a step count at an effective rate.
///
/// There is no upper cap on `steps`; arbitrarily large counts produce
/// proportionally larger results.
pub fn pending_units(steps: u64, effective_rate: f64) -> i64 {
    (blocks(steps) as f64 * effective_rate).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_blocks_earn_nothing() {
        assert_eq!(blocks(0), 0);
        assert_eq!(blocks(24), 0);
        assert_eq!(blocks(25), 1);
        assert_eq!(blocks(49), 1);
        assert_eq!(blocks(50), 2);
    }

    #[test]
    fn worked_example_no_bonuses() {
        // Tier 1, base rate 1.0, 10 000 steps -> 400 blocks -> 400 units.
        let rate = effective_rate(1.0, 1.0);
        assert_eq!(pending_units(10_000, rate), 400);
    }

    #[test]
    fn worked_example_weekend_and_milestone() {
        // x1.5 weekend, x1.10 25% milestone: 400 blocks at 1.65 -> 660.
        let rate = effective_rate(1.0, 1.5 * 1.10);
        assert!((rate - 1.65).abs() < 1e-9);
        assert_eq!(pending_units(10_000, rate), 660);
    }

    #[test]
    fn single_final_floor() {
        // 3 blocks at 1.4 = 4.2 -> 4, not floor(1.4)*3 = 3.
        assert_eq!(pending_units(75, 1.4), 4);
    }

    #[test]
    fn large_step_counts_scale_proportionally() {
        assert_eq!(pending_units(1_000_000, 1.0), 40_000);
        assert_eq!(pending_units(100_000_000, 2.5), 10_000_000);
    }

    proptest! {
        #[test]
        fn monotone_in_steps(steps in 0u64..10_000_000, extra in 0u64..1_000_000) {
            let rate = 1.65;
            prop_assert!(pending_units(steps + extra, rate) >= pending_units(steps, rate));
        }

        #[test]
        fn monotone_in_rate(steps in 0u64..10_000_000, rate in 0.0f64..10.0, bump in 0.0f64..5.0) {
            prop_assert!(pending_units(steps, rate + bump) >= pending_units(steps, rate));
        }

        #[test]
        fn deterministic(steps in 0u64..10_000_000, rate in 0.0f64..10.0) {
            prop_assert_eq!(pending_units(steps, rate), pending_units(steps, rate));
        }
    }
}
