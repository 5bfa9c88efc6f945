use clap::Subcommand;
use stridepay_core::RewardEngine;

#[derive(Subcommand)]
pub enum WalletAction {
    /// Show balance and lifetime totals
    Show {
        /// User id
        #[arg(long)]
        user: String,
    },
    /// List recent transactions, newest first
    Transactions {
        /// User id
        #[arg(long)]
        user: String,
        /// Maximum number of transactions
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

pub fn run(action: WalletAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = RewardEngine::open()?;

    match action {
        WalletAction::Show { user } => {
            let wallet = engine.wallet(&user)?;
            println!("{}", serde_json::to_string_pretty(&wallet)?);
        }
        WalletAction::Transactions { user, limit } => {
            let txs = engine.transactions(&user, limit)?;
            println!("{}", serde_json::to_string_pretty(&txs)?);
        }
    }
    Ok(())
}
