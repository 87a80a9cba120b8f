use anyhow::{bail, Context};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use clap::Parser;

use crate::models::ExportWindow;

/// Export Kraken ledgers to CSV or import them into cointracking.info
#[derive(Parser, Debug, Clone)]
#[command(name = "kraken-export", version, about)]
pub struct Cli {
    /// Start date of trades (format=[Y-m-d])
    #[arg(short, long, value_parser = parse_date)]
    pub start: NaiveDate,

    /// End date of trades (format=[Y-m-d]), defaults to now
    #[arg(short, long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Ledger types to exclude, comma separated. "withdrawal" entries are skipped by default
    #[arg(
        short = 'x',
        long = "excluded-types",
        value_delimiter = ',',
        default_value = "withdrawal"
    )]
    pub excluded_types: Vec<String>,

    /// Creates csv file containing your orders
    #[arg(long, group = "mode")]
    pub csv: bool,

    /// Imports orders to cointracking.info
    #[arg(long, group = "mode")]
    pub cointracking: bool,

    /// Forwards trade history to a transaction CSV
    #[arg(long, group = "mode")]
    pub trades: bool,

    /// CSV filename for --csv (written under exports/)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Csv,
    CoinTracking,
    Trades,
}

pub const MODE_GUIDANCE: &str = "Please use [--csv; to generate a csv export ] or [--cointracking; to export to cointracking.info]";

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected a date formatted as YYYY-MM-DD ({})", e))
}

fn local_midnight(date: NaiveDate) -> anyhow::Result<i64> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.timestamp())
        .with_context(|| format!("{} has no local midnight", date))
}

impl Cli {
    pub fn mode(&self) -> Option<Mode> {
        if self.csv {
            Some(Mode::Csv)
        } else if self.cointracking {
            Some(Mode::CoinTracking)
        } else if self.trades {
            Some(Mode::Trades)
        } else {
            None
        }
    }

    /// Export window from the parsed dates; a missing end date means `now`
    pub fn window(&self, now: DateTime<Local>) -> anyhow::Result<ExportWindow> {
        let start = local_midnight(self.start)?;
        let end = match self.end {
            Some(date) => local_midnight(date)?,
            None => now.timestamp(),
        };

        if end <= start {
            bail!("--end must be after --start");
        }

        Ok(ExportWindow::new(start, end))
    }
}
