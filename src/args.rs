use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Charts the price history of three Vanguard ETFs from their daily csv
/// files (vti.csv, voo.csv, vxus.csv).
#[derive(Parser)]
#[clap(version, author)]
pub struct Opts {
    /// Directory holding the fund csv files
    #[clap(short, long)]
    pub directory: Option<PathBuf>,
    /// Directory where charts are written
    #[clap(short, long)]
    pub out: Option<PathBuf>,
    /// Don't wait for Enter after each chart
    #[clap(short, long)]
    pub no_wait: bool,

    #[clap(short, long)]
    pub quiet: bool,
    /// Verbose mode (-v, -vv, -vvv, etc)
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: usize,
    /// Timestamp (sec, ms, ns, none)
    #[clap(short, long)]
    pub ts: Option<stderrlog::Timestamp>,

    #[clap(subcommand)]
    pub subcmd: Option<SubCommand>,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Draw the average and recent charts of each fund (default)
    Plot {
        /// Only funds whose ticker contains this text
        fund: Option<String>,
    },
    /// Check that all fund files are well formed
    Check {},
}

pub fn parse_args() -> Opts {
    let opts = Opts::parse();
    let directory = opts.directory.unwrap_or_else(|| PathBuf::from("."));
    let out = opts.out.unwrap_or_else(|| match dirs::data_dir() {
        Some(mut dd) => {
            dd.push("etfplot");
            dd
        }
        None => directory.join("charts"),
    });

    Opts {
        directory: Some(directory),
        out: Some(out),
        ..opts
    }
}
