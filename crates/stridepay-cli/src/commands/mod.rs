pub mod config;
pub mod redeem;
pub mod steps;
pub mod streak;
pub mod tier;
pub mod wallet;

use chrono::{NaiveDate, Utc};

/// Parse a `YYYY-MM-DD` date argument, defaulting to today.
pub fn parse_date(date: Option<String>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(s) => Ok(NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}': {e}"))?),
        None => Ok(Utc::now().date_naive()),
    }
}
