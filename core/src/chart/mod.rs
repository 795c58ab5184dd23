//! Speedup line chart: one line per workload, threads on x, speedup on y.
//!
//! The crate writes the chart as SVG itself. Other formats are produced by
//! handing that SVG to an external rasterizer command.

mod raster;
mod svg;

use std::fs;

use tracing::info;

use crate::config::ChartConfig;
use crate::error::{BenchError, Result};
use crate::report::BenchReport;
use crate::speedup::Speedup;

pub use svg::render_svg;

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub series: Vec<LabeledSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub label: String,
    pub points: Vec<(u32, Speedup)>,
}

impl LabeledSeries {
    /// Contiguous runs of defined points. An undefined speedup ends the
    /// current run, leaving a gap in the drawn line.
    pub fn segments(&self) -> Vec<Vec<(u32, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(threads, speedup) in &self.points {
            match speedup.ratio() {
                Some(ratio) => current.push((threads, ratio)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

impl Chart {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            title: config.title.clone(),
            x_label: config.x_label.clone(),
            y_label: config.y_label.clone(),
            width: config.width,
            height: config.height,
            series: Vec::new(),
        }
    }

    pub fn from_report(report: &BenchReport, config: &ChartConfig) -> Self {
        let mut chart = Self::new(config);
        for workload in &report.workloads {
            chart.series.push(LabeledSeries {
                label: workload.label.clone(),
                points: workload.points.iter().map(|p| (p.threads, p.speedup)).collect(),
            });
        }
        chart
    }

    /// The (threads, speedup) pairs that end up on the chart, per series.
    pub fn plotted_points(&self) -> Vec<(String, Vec<(u32, f64)>)> {
        self.series
            .iter()
            .map(|s| (s.label.clone(), s.segments().into_iter().flatten().collect()))
            .collect()
    }
}

/// Writes `chart` to `config.output`, replacing any existing file.
pub fn render_chart(chart: &Chart, config: &ChartConfig) -> Result<()> {
    let path = config.output.as_path();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
    }

    let svg = render_svg(chart);
    if config.is_svg() {
        fs::write(path, svg.as_bytes()).map_err(|e| BenchError::io(path, e))?;
    } else if let Some(command) = config.rasterizer.as_deref() {
        raster::rasterize(&svg, path, command)?;
    } else {
        return Err(BenchError::UnsupportedChartFormat(path.to_path_buf()));
    }
    info!(path = %path.display(), series = chart.series.len(), "chart written");
    Ok(())
}
