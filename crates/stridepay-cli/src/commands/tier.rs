use clap::Subcommand;
use stridepay_core::RewardEngine;

#[derive(Subcommand)]
pub enum TierAction {
    /// List the tier schedule
    List,
    /// Show a user's tier progress
    Progress {
        /// User id
        #[arg(long)]
        user: String,
    },
}

pub fn run(action: TierAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = RewardEngine::open()?;

    match action {
        TierAction::List => {
            let tiers: Vec<_> = engine.tiers().iter().collect();
            println!("{}", serde_json::to_string_pretty(&tiers)?);
        }
        TierAction::Progress { user } => {
            let progress = engine.tier_progress(&user)?;
            let completion = progress.completion(engine.tiers());
            let tier = engine.tiers().get(progress.tier_ordinal);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "user_id": progress.user_id,
                    "tier_ordinal": progress.tier_ordinal,
                    "tier_label": tier.map(|t| t.label.clone()),
                    "steps_in_tier": progress.steps_in_tier,
                    "completion": completion,
                }))?
            );
        }
    }
    Ok(())
}
