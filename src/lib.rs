#![recursion_limit = "1024"]
use std::{fmt, io, path};

use error_chain::bail;
use log::{debug, info};
use num_format::{Locale, ToFormattedString};

use crate::errors::*;

pub mod args;
pub mod chart;

pub mod errors {
    error_chain::error_chain! {}
}

/// Date layout used by the source files.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Number of trailing rows shown by the recent chart.
pub const RECENT_WINDOW: usize = 300;

#[derive(Debug)]
pub struct Fund {
    pub ticker: &'static str,
    pub description: &'static str,
    pub file_name: &'static str,
}

pub static FUNDS: [Fund; 3] = [
    Fund {
        ticker: "VTI",
        description: "Vanguard Total Stock Market ETF",
        file_name: "vti.csv",
    },
    Fund {
        ticker: "VOO",
        description: "Vanguard S&P 500 ETF",
        file_name: "voo.csv",
    },
    Fund {
        ticker: "VXUS",
        description: "Vanguard Total International Stock ETF",
        file_name: "vxus.csv",
    },
];

#[macro_export]
macro_rules! fmt_summary {
    () => {
        "{:<6}\t{:<40}\t{:>8}\t{:<10}\t{:<10}"
    };
}

/// One column of a csv file, typed after its header name.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Float(Vec<f64>),
    Integer(Vec<i64>),
}

impl Column {
    fn for_name(name: &str) -> Column {
        match name {
            "Open" | "High" | "Low" | "Close" => Column::Float(Vec::new()),
            "Volume" => Column::Integer(Vec::new()),
            _ => Column::Text(Vec::new()),
        }
    }

    fn push(&mut self, value: &str) -> std::result::Result<(), String> {
        match self {
            Column::Text(v) => v.push(value.to_owned()),
            Column::Float(v) => v.push(
                value
                    .parse()
                    .map_err(|_| format!("cannot parse '{}' as a number", value))?,
            ),
            Column::Integer(v) => v.push(
                value
                    .parse()
                    .map_err(|_| format!("cannot parse '{}' as an integer", value))?,
            ),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Integer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tail(&self, n: usize) -> Column {
        fn last<T: Clone>(v: &[T], n: usize) -> Vec<T> {
            v[v.len() - n.min(v.len())..].to_vec()
        }
        match self {
            Column::Text(v) => Column::Text(last(v, n)),
            Column::Float(v) => Column::Float(last(v, n)),
            Column::Integer(v) => Column::Integer(last(v, n)),
        }
    }
}

/// The content of one csv file, organized by column. All columns have the
/// same length and keep the row order of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl ColumnSet {
    pub fn from_path(path: &path::Path) -> Result<ColumnSet> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .chain_err(|| format!("Cannot open {}", path.to_string_lossy()))?;

        ColumnSet::read(&mut rdr, &path.to_string_lossy())
    }

    pub fn from_reader<R: io::Read>(reader: R, source: &str) -> Result<ColumnSet> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        ColumnSet::read(&mut rdr, source)
    }

    // Single pass: every record fills all the columns at once.
    fn read<R: io::Read>(rdr: &mut csv::Reader<R>, source: &str) -> Result<ColumnSet> {
        let headers = rdr
            .headers()
            .chain_err(|| format!("{}: can't read headers", source))?
            .clone();

        let names: Vec<String> = headers.iter().map(|h| h.to_owned()).collect();
        let mut columns: Vec<Column> = names.iter().map(|n| Column::for_name(n)).collect();

        let mut raw_record = csv::StringRecord::new();
        while rdr
            .read_record(&mut raw_record)
            .chain_err(|| format!("{}: badly formatted csv", source))?
        {
            let line = raw_record.position().map_or(0, |p| p.line());
            let cells = names.iter().zip(columns.iter_mut()).zip(raw_record.iter());
            for ((name, column), value) in cells {
                if let Err(e) = column.push(value) {
                    bail!("{}: line {}, column {}: {}", source, line, name, e);
                }
            }
        }

        let set = ColumnSet { names, columns };
        debug!("{}: {} columns, {} rows", source, set.names.len(), set.len());
        Ok(set)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::from(format!("Column '{}' not found", name)))
    }

    pub fn texts(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v.as_slice()),
            _ => bail!("Column '{}' is not textual", name),
        }
    }

    pub fn floats(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v.as_slice()),
            _ => bail!("Column '{}' is not a price column", name),
        }
    }

    pub fn integers(&self, name: &str) -> Result<&[i64]> {
        match self.column(name)? {
            Column::Integer(v) => Ok(v.as_slice()),
            _ => bail!("Column '{}' is not an integer column", name),
        }
    }

    /// The last `min(window, len)` rows.
    pub fn recent(&self, window: usize) -> ColumnSet {
        ColumnSet {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.tail(window)).collect(),
        }
    }
}

/// A column set with the name it is displayed under.
#[derive(Debug, Clone, PartialEq)]
pub struct FundDataset {
    pub name: String,
    pub columns: ColumnSet,
}

impl FundDataset {
    pub fn load(name: &str, path: &path::Path) -> Result<FundDataset> {
        let columns = ColumnSet::from_path(path)?;
        info!("{}: {} rows loaded from {}", name, columns.len(), path.to_string_lossy());
        Ok(FundDataset {
            name: name.to_owned(),
            columns,
        })
    }
}

pub struct FundSummary {
    pub ticker: String,
    pub description: String,
    pub rows: usize,
    pub first: Option<chrono::NaiveDate>,
    pub last: Option<chrono::NaiveDate>,
}

trait Separate {
    fn sep(&self) -> String;
}

impl Separate for usize {
    fn sep(&self) -> String {
        self.to_formatted_string(&Locale::en)
    }
}

impl fmt::Display for FundSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let day = |d: &Option<chrono::NaiveDate>| {
            d.map_or("<NA>".to_owned(), |d| d.format("%Y-%m-%d").to_string())
        };
        write!(
            f,
            fmt_summary!(),
            self.ticker,
            self.description,
            self.rows.sep(),
            day(&self.first),
            day(&self.last)
        )
    }
}

/// Directory holding the fund files.
pub struct DataDir<'a> {
    pub home_dir: &'a path::Path,
}

impl DataDir<'_> {
    pub fn open(home_dir: &path::Path) -> Result<DataDir> {
        if home_dir.is_dir() {
            Ok(DataDir { home_dir })
        } else {
            bail!("Can't find data directory {}", home_dir.to_string_lossy())
        }
    }

    /// Funds whose ticker contains `ticker_substring`, ignoring case.
    pub fn funds(ticker_substring: Option<&str>) -> Vec<&'static Fund> {
        let s = ticker_substring.unwrap_or_default().to_lowercase();
        FUNDS
            .iter()
            .filter(|f| f.ticker.to_lowercase().contains(&s))
            .collect()
    }

    pub fn load(&self, fund: &Fund) -> Result<FundDataset> {
        FundDataset::load(fund.ticker, &self.home_dir.join(fund.file_name))
    }

    /// Loads every selected fund before anything is drawn.
    pub fn load_all(&self, ticker_substring: Option<&str>) -> Result<Vec<FundDataset>> {
        let funds = DataDir::funds(ticker_substring);
        if funds.is_empty() {
            bail!(
                "No fund matches '{}'",
                ticker_substring.unwrap_or_default()
            );
        }
        funds.into_iter().map(|f| self.load(f)).collect()
    }

    pub fn check(&self) -> Result<Vec<FundSummary>> {
        FUNDS
            .iter()
            .map(|fund| {
                let data = self.load(fund)?;
                let dates = chart::parse_dates(data.columns.texts("Date")?)?;
                Ok(FundSummary {
                    ticker: fund.ticker.to_owned(),
                    description: fund.description.to_owned(),
                    rows: data.columns.len(),
                    first: dates.first().cloned(),
                    last: dates.last().cloned(),
                })
            })
            .collect()
    }
}
