use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stridepay-cli", version, about = "StridePay CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Step recording
    Steps {
        #[command(subcommand)]
        action: commands::steps::StepsAction,
    },
    /// Redeem a day's pending earnings
    Redeem(commands::redeem::RedeemArgs),
    /// Wallet balance and transaction history
    Wallet {
        #[command(subcommand)]
        action: commands::wallet::WalletAction,
    },
    /// Streak state
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Tier schedule and per-user progress
    Tier {
        #[command(subcommand)]
        action: commands::tier::TierAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Steps { action } => commands::steps::run(action),
        Commands::Redeem(args) => commands::redeem::run(args),
        Commands::Wallet { action } => commands::wallet::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Tier { action } => commands::tier::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
