use etfplot::chart::{average_trend, render_fund, Chart, ChartSink, SvgRenderer};
use etfplot::errors::*;
use etfplot::{ColumnSet, DataDir, FundDataset, RECENT_WINDOW};
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

const HEADER: &str = "Date,Open,High,Low,Close,Volume";
const THREE_DAYS: &str = "Date,Open,High,Low,Close,Volume
01/01/2020,10.0,11.0,9.0,10.5,1000
01/02/2020,10.5,12.0,10.0,11.5,1200
01/03/2020,11.5,11.8,11.0,11.2,900
";

// Can't create this as a standard function because 'data' borrows 'home'
macro_rules! temp_data {
    ($var:ident, $home:ident, $content:expr) => {
        let $home = tempdir().chain_err(|| "Can't create temporary dir")?;
        for name in &["vti.csv", "voo.csv", "vxus.csv"] {
            write_file($home.path(), name, $content)?;
        }
        let $var = DataDir::open($home.as_ref())?;
    };
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    fs::write(dir.join(name), content).chain_err(|| format!("Can't write {}", name))
}

fn close_to(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[derive(Default)]
struct Recorder {
    charts: Vec<Chart>,
}

impl ChartSink for Recorder {
    fn show(&mut self, chart: &Chart) -> Result<()> {
        self.charts.push(chart.clone());
        Ok(())
    }
}

#[test]
fn loads_three_day_file() -> Result<()> {
    temp_data!(data, home, THREE_DAYS);
    let vti = data.load(&etfplot::FUNDS[0])?;

    assert_eq!("VTI", vti.name);
    assert_eq!(3, vti.columns.len());
    assert_eq!(
        vec!["01/01/2020", "01/02/2020", "01/03/2020"],
        vti.columns.texts("Date")?.to_vec()
    );
    assert_eq!(&[10.5, 11.5, 11.2][..], vti.columns.floats("Close")?);

    let avg: Vec<f64> = average_trend(&vti)?.into_iter().map(|p| p.1).collect();
    assert_eq!(3, avg.len());
    for (got, want) in avg.iter().zip(&[10.25, 11.0, 11.35]) {
        assert!(close_to(*got, *want), "{} != {}", got, want);
    }

    assert_eq!(vti.columns, vti.columns.recent(RECENT_WINDOW));
    Ok(())
}

#[test]
fn every_column_has_one_value_per_row() -> Result<()> {
    let mut csv = HEADER.to_owned();
    for i in 1..=28 {
        csv.push_str(&format!("\n02/{:02}/2021,{}.25,{}.5,{}.0,{}.75,{}", i, i, i, i, i, i * 10));
    }
    let set = ColumnSet::from_reader(csv.as_bytes(), "feb")?;

    assert_eq!(28, set.len());
    for name in set.names() {
        assert_eq!(28, set.column(name)?.len());
    }
    Ok(())
}

#[test]
fn prices_round_trip_through_text() -> Result<()> {
    let set = ColumnSet::from_reader(THREE_DAYS.as_bytes(), "three")?;
    let high = set.floats("High")?;
    for (v, text) in high.iter().zip(&["11.0", "12.0", "11.8"]) {
        assert_eq!(text.parse::<f64>().ok(), Some(*v));
        assert_eq!(v.to_string().parse::<f64>().ok(), Some(*v));
    }
    Ok(())
}

#[test]
fn header_only_file_has_empty_columns() -> Result<()> {
    temp_data!(data, home, HEADER);
    let vti = data.load(&etfplot::FUNDS[0])?;

    assert_eq!(6, vti.columns.names().len());
    assert_eq!(0, vti.columns.len());
    assert_eq!(0, vti.columns.recent(RECENT_WINDOW).len());
    Ok(())
}

#[test]
fn bad_price_fails_the_load() -> Result<()> {
    let csv = format!("{}\n01/01/2020,10.0,11.0,9.0,abc,1000\n", HEADER);
    temp_data!(data, home, &csv);

    let r = data.load(&etfplot::FUNDS[1]);
    assert_eq!(true, r.is_err());
    let msg = r.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(msg.contains("Close"), "{}", msg);
    assert!(msg.contains("abc"), "{}", msg);
    Ok(())
}

#[test]
fn missing_file_fails_the_load() -> Result<()> {
    let home = tempdir().chain_err(|| "Can't create temporary dir")?;
    let data = DataDir::open(home.as_ref())?;
    assert_eq!(true, data.load_all(None).is_err());
    assert_eq!(true, FundDataset::load("VTI", &home.path().join("vti.csv")).is_err());
    Ok(())
}

#[test]
fn missing_directory_is_an_error() -> Result<()> {
    let home = tempdir().chain_err(|| "Can't create temporary dir")?;
    assert_eq!(true, DataDir::open(&home.path().join("nope")).is_err());
    Ok(())
}

#[test]
fn bad_date_fails_the_chart() -> Result<()> {
    let csv = format!("{}\n2020-01-01,10.0,11.0,9.0,10.5,1000\n", HEADER);
    temp_data!(data, home, &csv);
    let vti = data.load(&etfplot::FUNDS[0])?;

    assert_eq!(true, Chart::average(&vti).is_err());
    assert_eq!(true, Chart::recent(&vti, RECENT_WINDOW).is_err());
    assert_eq!(true, data.check().is_err());
    Ok(())
}

#[test]
fn check_reports_each_fund() -> Result<()> {
    temp_data!(data, home, THREE_DAYS);
    let summaries = data.check()?;

    let tickers: Vec<_> = summaries.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(vec!["VTI", "VOO", "VXUS"], tickers);
    assert_eq!(3, summaries[2].rows);
    assert_eq!(
        Some("2020-01-03".to_owned()),
        summaries[0].last.map(|d| d.format("%Y-%m-%d").to_string())
    );
    Ok(())
}

#[test]
fn each_fund_gets_two_charts_in_order() -> Result<()> {
    temp_data!(data, home, THREE_DAYS);
    let mut recorder = Recorder::default();

    for fund in data.load_all(None)? {
        render_fund(&mut recorder, &fund, RECENT_WINDOW)?;
    }

    let titles: Vec<_> = recorder.charts.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        vec![
            "VTI: Open and Close Price Average",
            "VTI: Recent High and Low performance",
            "VOO: Open and Close Price Average",
            "VOO: Recent High and Low performance",
            "VXUS: Open and Close Price Average",
            "VXUS: Recent High and Low performance",
        ],
        titles
    );
    assert_eq!(3, recorder.charts[1].series[0].points.len());
    Ok(())
}

#[test]
fn fund_filter_selects_one_file() -> Result<()> {
    let home = tempdir().chain_err(|| "Can't create temporary dir")?;
    write_file(home.path(), "voo.csv", THREE_DAYS)?;
    let data = DataDir::open(home.as_ref())?;

    let funds = data.load_all(Some("voo"))?;
    assert_eq!(1, funds.len());
    assert_eq!("VOO", funds[0].name);
    assert_eq!(true, data.load_all(Some("spy")).is_err());
    Ok(())
}

#[test]
fn svg_renderer_writes_one_file_per_chart() -> Result<()> {
    temp_data!(data, home, THREE_DAYS);
    let out = home.path().join("charts");
    let mut renderer = SvgRenderer::new(&out, false)?;

    let vxus = data.load(&etfplot::FUNDS[2])?;
    render_fund(&mut renderer, &vxus, RECENT_WINDOW)?;

    for name in &["vxus_average.svg", "vxus_recent.svg"] {
        let svg = fs::read_to_string(out.join(name)).chain_err(|| format!("{} missing", name))?;
        assert!(svg.contains("<svg"));
    }
    Ok(())
}
