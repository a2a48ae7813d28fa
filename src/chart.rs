use std::io::{self, Write};
use std::ops::Range;
use std::{fs, path};

use chrono::NaiveDate;
use error_chain::bail;
use itertools::{Itertools, MinMaxResult};
use log::{debug, info, warn};
use plotters::prelude::*;

use crate::errors::*;
use crate::{FundDataset, DATE_FORMAT};

/// Rows per x label on the full history chart.
pub const AVERAGE_LABEL_EVERY: usize = 500;
/// Rows per x label on the recent chart.
pub const RECENT_LABEL_EVERY: usize = 50;

const LABEL_FORMAT: &str = "%Y-%m-%d";
const PLOT_BACKGROUND: RGBColor = RGBColor(211, 211, 211);

pub fn parse_dates(values: &[String]) -> Result<Vec<NaiveDate>> {
    values
        .iter()
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT)
                .chain_err(|| format!("Cannot parse date '{}', expected MM/DD/YYYY", v))
        })
        .collect()
}

/// Mean of open and close for every row of the fund.
pub fn average_trend(fund: &FundDataset) -> Result<Vec<(NaiveDate, f64)>> {
    let dates = parse_dates(fund.columns.texts("Date")?)?;
    let open = fund.columns.floats("Open")?;
    let close = fund.columns.floats("Close")?;

    Ok(dates
        .into_iter()
        .zip(open.iter().zip(close))
        .map(|(d, (o, c))| (d, (o + c) / 2.0))
        .collect())
}

/// High and low series over the last `window` rows.
pub fn recent_high_low(
    fund: &FundDataset,
    window: usize,
) -> Result<(Vec<(NaiveDate, f64)>, Vec<(NaiveDate, f64)>)> {
    let recent = fund.columns.recent(window);
    if recent.len() < window {
        warn!(
            "{}: only {} rows available for a {} rows window",
            fund.name,
            recent.len(),
            window
        );
    }

    let dates = parse_dates(recent.texts("Date")?)?;
    let pair = |name| -> Result<Vec<(NaiveDate, f64)>> {
        Ok(dates.iter().cloned().zip(recent.floats(name)?.iter().cloned()).collect())
    };
    Ok((pair("High")?, pair("Low")?))
}

fn label_count(rows: usize, every: usize) -> usize {
    ((rows + every - 1) / every).max(2)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind {
    Average,
    Recent,
}

impl ChartKind {
    fn suffix(&self) -> &'static str {
        match self {
            ChartKind::Average => "average",
            ChartKind::Recent => "recent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: (u8, u8, u8),
    pub points: Vec<(NaiveDate, f64)>,
}

/// Everything needed to draw one chart, independent of the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub fund: String,
    pub kind: ChartKind,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub x_labels: usize,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn average(fund: &FundDataset) -> Result<Chart> {
        let points = average_trend(fund)?;
        let x_labels = label_count(points.len(), AVERAGE_LABEL_EVERY);
        debug!("{}: average chart, {} x labels", fund.name, x_labels);

        Ok(Chart {
            fund: fund.name.clone(),
            kind: ChartKind::Average,
            title: format!("{}: Open and Close Price Average", fund.name),
            x_desc: "Date".to_owned(),
            y_desc: "Price in USD".to_owned(),
            x_labels,
            series: vec![Series {
                label: "Average".to_owned(),
                color: (255, 0, 0),
                points,
            }],
        })
    }

    pub fn recent(fund: &FundDataset, window: usize) -> Result<Chart> {
        let (high, low) = recent_high_low(fund, window)?;
        let x_labels = label_count(high.len(), RECENT_LABEL_EVERY);
        debug!("{}: recent chart, {} x labels", fund.name, x_labels);

        Ok(Chart {
            fund: fund.name.clone(),
            kind: ChartKind::Recent,
            title: format!("{}: Recent High and Low performance", fund.name),
            x_desc: "Date".to_owned(),
            y_desc: "Price in USD".to_owned(),
            x_labels,
            series: vec![
                Series {
                    label: "High".to_owned(),
                    color: (31, 119, 180),
                    points: high,
                },
                Series {
                    label: "Low".to_owned(),
                    color: (255, 127, 14),
                    points: low,
                },
            ],
        })
    }

    fn points(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.series.iter().flat_map(|s| s.points.iter())
    }

    pub fn date_range(&self) -> Result<Range<NaiveDate>> {
        match self.points().map(|p| p.0).minmax() {
            MinMaxResult::NoElements => bail!("{}: no rows to plot", self.fund),
            MinMaxResult::OneElement(d) => Ok(d..d + chrono::Duration::days(1)),
            MinMaxResult::MinMax(first, last) => Ok(first..last),
        }
    }

    pub fn value_range(&self) -> Result<Range<f64>> {
        let (low, high) = match self.points().map(|p| p.1).minmax() {
            MinMaxResult::NoElements => bail!("{}: no rows to plot", self.fund),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(low, high) => (low, high),
        };
        let pad = if high > low { (high - low) * 0.05 } else { 1.0 };
        Ok(low - pad..high + pad)
    }
}

/// Where finished charts go.
pub trait ChartSink {
    fn show(&mut self, chart: &Chart) -> Result<()>;
}

/// Draws both charts of a fund, the average one first.
pub fn render_fund<S: ChartSink>(sink: &mut S, fund: &FundDataset, window: usize) -> Result<()> {
    sink.show(&Chart::average(fund)?)?;
    sink.show(&Chart::recent(fund, window)?)
}

/// Writes each chart as an svg file and, when `wait` is set, blocks until
/// the user dismisses it.
pub struct SvgRenderer {
    pub out_dir: path::PathBuf,
    pub wait: bool,
    pub size: (u32, u32),
}

impl SvgRenderer {
    pub fn new(out_dir: &path::Path, wait: bool) -> Result<SvgRenderer> {
        fs::create_dir_all(out_dir)
            .chain_err(|| format!("Can't create chart directory at {}", out_dir.to_string_lossy()))?;

        Ok(SvgRenderer {
            out_dir: out_dir.to_owned(),
            wait,
            size: (1024, 768),
        })
    }

    pub fn path_for(&self, chart: &Chart) -> path::PathBuf {
        self.out_dir.join(format!(
            "{}_{}.svg",
            chart.fund.to_lowercase(),
            chart.kind.suffix()
        ))
    }

    fn draw(&self, chart: &Chart, out: &path::Path) -> Result<()> {
        let dates = chart.date_range()?;
        let values = chart.value_range()?;

        let root = SVGBackend::new(out, self.size).into_drawing_area();
        root.fill(&WHITE).chain_err(|| "Cannot clear the chart")?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(90)
            .y_label_area_size(70)
            .build_cartesian_2d(dates, values)
            .chain_err(|| "Cannot build the chart axes")?;

        ctx.plotting_area()
            .fill(&PLOT_BACKGROUND)
            .chain_err(|| "Cannot fill the plotting area")?;

        ctx.configure_mesh()
            .x_labels(chart.x_labels)
            .x_label_formatter(&|d: &NaiveDate| d.format(LABEL_FORMAT).to_string())
            .x_label_style(
                ("sans-serif", 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .draw()
            .chain_err(|| "Cannot draw the mesh")?;

        for series in &chart.series {
            let color = RGBColor(series.color.0, series.color.1, series.color.2);
            ctx.draw_series(LineSeries::new(
                series.points.iter().cloned(),
                color.stroke_width(2),
            ))
            .chain_err(|| format!("Cannot draw series {}", series.label))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .chain_err(|| "Cannot draw the legend")?;

        root.present()
            .chain_err(|| format!("Cannot write {}", out.to_string_lossy()))
    }

    fn wait_for_dismiss(&self, out: &path::Path) -> Result<()> {
        print!("{}: press Enter to continue ", out.to_string_lossy());
        io::stdout().flush().chain_err(|| "Cannot flush stdout")?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .chain_err(|| "Cannot read from stdin")?;
        Ok(())
    }
}

impl ChartSink for SvgRenderer {
    fn show(&mut self, chart: &Chart) -> Result<()> {
        let out = self.path_for(chart);
        self.draw(chart, &out)?;
        info!("{}: chart written to {}", chart.fund, out.to_string_lossy());

        if self.wait {
            self.wait_for_dismiss(&out)?;
        }
        Ok(())
    }
}
