//! Multiplicative bonus composition.
//!
//! Each bonus source contributes a multiplier >= 1. Sources are
//! represented as tagged variants collected into an ordered list and
//! folded by multiplication, so the composition is reproducible and
//! each source can be tested on its own.
//!
//! Order of application: seasonal, weekend, streak, progress milestone.
//! Multiplication commutes, but the fixed order keeps description
//! output stable.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Streak length at which the streak rate bonus becomes active.
pub const STREAK_BONUS_MIN_DAYS: u32 = 7;

/// Discriminant for a bonus source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Seasonal,
    Weekend,
    Streak,
    ProgressMilestone,
}

/// One active bonus source: its kind, multiplier and a human-readable
/// description. The description is informational only and never feeds
/// back into the numeric result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusSource {
    pub kind: BonusKind,
    pub multiplier: f64,
    pub description: String,
}

/// Seasonal band. The three bands partition all twelve months; exactly
/// one band is active for any calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// December through February.
    WinterChallenge,
    /// June through August.
    SummerBoost,
    /// March through May and September through November.
    Standard,
}

impl Season {
    pub fn for_date(date: NaiveDate) -> Self {
        match date.month() {
            12 | 1 | 2 => Season::WinterChallenge,
            6 | 7 | 8 => Season::SummerBoost,
            _ => Season::Standard,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Season::WinterChallenge => 1.3,
            Season::SummerBoost => 1.2,
            Season::Standard => 1.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Season::WinterChallenge => "Winter Challenge season",
            Season::SummerBoost => "Summer Boost season",
            Season::Standard => "Standard season",
        }
    }
}

/// Everything the bonus calculator needs to know about the moment a
/// step count is being valued.
#[derive(Debug, Clone, Copy)]
pub struct BonusContext {
    pub date: NaiveDate,
    /// Current consecutive qualifying days.
    pub streak_days: u32,
    /// The user's current tier ordinal.
    pub tier_ordinal: u32,
    /// Completion fraction within the current tier, 0.0 .. 1.0.
    pub tier_completion: f64,
}

/// Combined bonus result: the folded factor plus the descriptions of
/// the sources that were active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusBreakdown {
    pub factor: f64,
    pub active: Vec<BonusSource>,
}

impl BonusBreakdown {
    pub fn descriptions(&self) -> Vec<String> {
        self.active.iter().map(|b| b.description.clone()).collect()
    }
}

/// Collect the active bonus sources for a context, in application order.
///
/// Sources whose multiplier works out to exactly 1 are omitted; they
/// contribute nothing to the factor or the description list.
pub fn active_bonuses(ctx: &BonusContext) -> Vec<BonusSource> {
    let mut sources = Vec::new();

    let season = Season::for_date(ctx.date);
    if season.multiplier() > 1.0 {
        sources.push(BonusSource {
            kind: BonusKind::Seasonal,
            multiplier: season.multiplier(),
            description: season.description().to_string(),
        });
    }

    let weekday = ctx.date.weekday();
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        sources.push(BonusSource {
            kind: BonusKind::Weekend,
            multiplier: 1.5,
            description: "Weekend bonus".to_string(),
        });
    }

    if ctx.streak_days >= STREAK_BONUS_MIN_DAYS {
        // Grows with tier, not with streak length.
        let multiplier = 1.0 + 0.1 * ctx.tier_ordinal as f64;
        sources.push(BonusSource {
            kind: BonusKind::Streak,
            multiplier,
            description: format!("{}-day streak bonus", ctx.streak_days),
        });
    }

    // Single highest band only.
    let milestone = if ctx.tier_completion >= 0.75 {
        Some((1.25, "75% tier progress milestone"))
    } else if ctx.tier_completion >= 0.50 {
        Some((1.15, "50% tier progress milestone"))
    } else if ctx.tier_completion >= 0.25 {
        Some((1.10, "25% tier progress milestone"))
    } else {
        None
    };
    if let Some((multiplier, description)) = milestone {
        sources.push(BonusSource {
            kind: BonusKind::ProgressMilestone,
            multiplier,
            description: description.to_string(),
        });
    }

    sources
}

/// Fold the active sources into a single multiplicative factor.
pub fn combined_factor(ctx: &BonusContext) -> BonusBreakdown {
    let active = active_bonuses(ctx);
    let factor = active.iter().fold(1.0, |acc, b| acc * b.multiplier);
    BonusBreakdown { factor, active }
}
