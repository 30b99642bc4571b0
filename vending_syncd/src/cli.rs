use chrono::NaiveDate;
use clap::Parser;

/// Mirrors vending-machine orders from the XY platform into local storage.
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about)]
pub struct Arguments {
    /// Run a single sync cycle and exit, instead of polling forever.
    #[arg(long)]
    pub once: bool,
    /// Query window start date (YYYY-MM-DD, taken as midnight). Overrides the resume point.
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Query window end date (YYYY-MM-DD, inclusive). Overrides the default end of the window.
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Rows per page when querying the platform. Overrides VGW_PAGE_SIZE.
    #[arg(long)]
    pub page_size: Option<u64>,
}
