use clap::Subcommand;
use stridepay_core::RewardEngine;

use super::parse_date;

#[derive(Subcommand)]
pub enum StepsAction {
    /// Record the cumulative step count for a date
    Record {
        /// User id
        #[arg(long)]
        user: String,
        /// Cumulative steps for the date (recomputes, does not add)
        steps: u64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the earning record for a date
    Show {
        /// User id
        #[arg(long)]
        user: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: StepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = RewardEngine::open()?;

    match action {
        StepsAction::Record { user, steps, date } => {
            let date = parse_date(date)?;
            let report = engine.record_steps(&user, date, steps)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StepsAction::Show { user, date } => {
            let date = parse_date(date)?;
            match engine.daily_record(&user, date)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("no steps recorded for {date}"),
            }
        }
    }
    Ok(())
}
