use clap::Args;
use stridepay_core::RewardEngine;

use super::parse_date;

#[derive(Args)]
pub struct RedeemArgs {
    /// User id
    #[arg(long)]
    pub user: String,
    /// Date to redeem (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<String>,
    /// Idempotency key; stable across retries of the same action.
    /// Defaults to one key per user per date, so re-running the
    /// command replays the original result instead of double-paying.
    #[arg(long)]
    pub key: Option<String>,
}

pub fn run(args: RedeemArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = RewardEngine::open()?;
    let date = parse_date(args.date)?;
    let key = args
        .key
        .unwrap_or_else(|| format!("cli-{}-{date}", args.user));

    let report = engine.redeem(&args.user, date, &key)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
