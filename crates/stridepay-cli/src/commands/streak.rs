use clap::Subcommand;
use stridepay_core::RewardEngine;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show current and longest streak
    Show {
        /// User id
        #[arg(long)]
        user: String,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = RewardEngine::open()?;

    match action {
        StreakAction::Show { user } => {
            let streak = engine.streak(&user)?;
            println!("{}", serde_json::to_string_pretty(&streak)?);
        }
    }
    Ok(())
}
