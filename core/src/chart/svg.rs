use std::fmt::{self, Write as _};

use super::Chart;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 150.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;

/// Plot area and the data ranges it maps.
struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(chart: &Chart) -> Self {
        let threads: Vec<f64> = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(t, _)| f64::from(*t)))
            .collect();
        let (mut x_min, mut x_max) = min_max(&threads).unwrap_or((1.0, 2.0));
        if x_min == x_max {
            x_min = (x_min - 1.0).max(0.0);
            x_max += 1.0;
        }

        let ratios: Vec<f64> = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().filter_map(|(_, sp)| sp.ratio()))
            .collect();
        let (low, high) = min_max(&ratios).unwrap_or((0.0, 1.0));
        let y_min = low.min(0.0);
        // 10% headroom, saturating at f64::MAX for ratios near the top of the range
        let y_max = if high > 0.0 { (high + high * 0.1).min(f64::MAX) } else { 1.0 };

        Self {
            left: MARGIN_LEFT,
            right: f64::from(chart.width) - MARGIN_RIGHT,
            top: MARGIN_TOP,
            bottom: f64::from(chart.height) - MARGIN_BOTTOM,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn x(&self, value: f64) -> f64 {
        self.left + (value - self.x_min) / (self.x_max - self.x_min) * (self.right - self.left)
    }

    fn y(&self, value: f64) -> f64 {
        let fraction = (value / 2.0 - self.y_min / 2.0) / self.half_span();
        self.bottom - fraction * (self.bottom - self.top)
    }

    /// Half of `y_max - y_min`, which stays finite even when the full span would not.
    fn half_span(&self) -> f64 {
        self.y_max / 2.0 - self.y_min / 2.0
    }

    fn y_tick(&self, step: usize) -> f64 {
        self.y_min + self.half_span() * (2.0 * step as f64 / Y_TICKS as f64)
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Renders `chart` as a standalone SVG document. Output is deterministic.
pub fn render_svg(chart: &Chart) -> String {
    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = write_svg(chart, &mut svg);
    svg
}

fn write_svg(chart: &Chart, svg: &mut String) -> fmt::Result {
    let frame = Frame::new(chart);
    let (width, height) = (chart.width, chart.height);

    writeln!(svg, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    )?;
    writeln!(svg, "  <style>")?;
    writeln!(svg, "    text {{ font-family: sans-serif; font-size: 12px; fill: #222; }}")?;
    writeln!(svg, "    .axis {{ stroke: #222; stroke-width: 1; }}")?;
    writeln!(svg, "    .grid {{ stroke: #ddd; stroke-width: 1; }}")?;
    writeln!(svg, "  </style>")?;
    writeln!(svg, "  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>")?;

    if let Some(title) = &chart.title {
        writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
            (frame.left + frame.right) / 2.0,
            escape(title)
        )?;
    }

    write_axes(chart, &frame, svg)?;

    for (index, series) in chart.series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        writeln!(svg, "  <g class=\"series\" data-label=\"{}\">", escape(&series.label))?;
        for segment in series.segments() {
            let points: Vec<String> = segment
                .iter()
                .map(|&(t, r)| format!("{:.2},{:.2}", frame.x(f64::from(t)), frame.y(r)))
                .collect();
            writeln!(
                svg,
                "    <polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{}\"/>",
                points.join(" ")
            )?;
            for &(t, r) in &segment {
                writeln!(
                    svg,
                    "    <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3\" fill=\"{color}\" data-threads=\"{t}\" data-speedup=\"{r}\"/>",
                    frame.x(f64::from(t)),
                    frame.y(r)
                )?;
            }
        }
        writeln!(svg, "  </g>")?;
    }

    write_legend(chart, &frame, svg)?;
    writeln!(svg, "</svg>")
}

fn write_axes(chart: &Chart, frame: &Frame, svg: &mut String) -> fmt::Result {
    let mut ticks: Vec<u32> = chart.series.iter().flat_map(|s| s.points.iter().map(|(t, _)| *t)).collect();
    ticks.sort_unstable();
    ticks.dedup();

    for tick in &ticks {
        let x = frame.x(f64::from(*tick));
        writeln!(
            svg,
            "  <line class=\"grid\" x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\"/>",
            frame.top, frame.bottom
        )?;
        writeln!(
            svg,
            "  <text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{tick}</text>",
            frame.bottom + 18.0
        )?;
    }

    for step in 0..=Y_TICKS {
        let value = frame.y_tick(step);
        let y = frame.y(value);
        writeln!(
            svg,
            "  <line class=\"grid\" x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\"/>",
            frame.left, frame.right
        )?;
        writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{value:.1}</text>",
            frame.left - 8.0,
            y + 4.0
        )?;
    }

    writeln!(
        svg,
        "  <line class=\"axis\" x1=\"{l:.2}\" y1=\"{b:.2}\" x2=\"{r:.2}\" y2=\"{b:.2}\"/>",
        l = frame.left,
        r = frame.right,
        b = frame.bottom
    )?;
    writeln!(
        svg,
        "  <line class=\"axis\" x1=\"{l:.2}\" y1=\"{t:.2}\" x2=\"{l:.2}\" y2=\"{b:.2}\"/>",
        l = frame.left,
        t = frame.top,
        b = frame.bottom
    )?;
    writeln!(
        svg,
        "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"14\">{}</text>",
        (frame.left + frame.right) / 2.0,
        f64::from(chart.height) - 18.0,
        escape(&chart.x_label)
    )?;
    let mid_y = (frame.top + frame.bottom) / 2.0;
    writeln!(
        svg,
        "  <text x=\"20\" y=\"{mid_y:.2}\" text-anchor=\"middle\" font-size=\"14\" transform=\"rotate(-90 20 {mid_y:.2})\">{}</text>",
        escape(&chart.y_label)
    )
}

fn write_legend(chart: &Chart, frame: &Frame, svg: &mut String) -> fmt::Result {
    if chart.series.is_empty() {
        return Ok(());
    }
    let x = frame.right + 20.0;
    writeln!(svg, "  <g class=\"legend\">")?;
    for (index, series) in chart.series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let y = frame.top + 10.0 + index as f64 * 20.0;
        writeln!(
            svg,
            "    <line x1=\"{x:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{color}\" stroke-width=\"2\"/>",
            x + 24.0
        )?;
        writeln!(
            svg,
            "    <text x=\"{:.2}\" y=\"{:.2}\">{}</text>",
            x + 30.0,
            y + 4.0,
            escape(&series.label)
        )?;
    }
    writeln!(svg, "  </g>")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
