//! Inline SVG line chart for the dashboard.

use crate::dashboard::escape_html;
use crate::display::{format_thousands, ChartSeries};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 350.0;
const MARGIN_LEFT: f64 = 96.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 44.0;
const PALETTE: [&str; 4] = ["#0c5f78", "#c2571a", "#4f7d2c", "#7a3f8f"];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    fn of(chart: &ChartSeries) -> Option<Self> {
        let mut values = chart
            .series
            .iter()
            .flat_map(|series| series.values.iter().flatten().copied())
            .filter(|value| value.is_finite());
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), value| (lo.min(value), hi.max(value)));
        if (max - min).abs() < f64::EPSILON {
            let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
            return Some(Self {
                min: min - pad,
                max: max + pad,
            });
        }
        Some(Self { min, max })
    }

    fn scale(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_height * (1.0 - (value - self.min) / (self.max - self.min))
    }
}

fn x_position(idx: usize, count: usize) -> f64 {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    if count <= 1 {
        return MARGIN_LEFT + plot_width / 2.0;
    }
    MARGIN_LEFT + plot_width * idx as f64 / (count - 1) as f64
}

/// Splits a series at missing values so gaps are not bridged.
fn segments(values: &[Option<f64>], bounds: &Bounds) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();

    for (idx, value) in values.iter().enumerate() {
        match value.filter(|v| v.is_finite()) {
            Some(v) => current.push((x_position(idx, values.len()), bounds.scale(v))),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Renders the chart as a standalone `<svg>` element. Returns `None` when no
/// series has a plottable value.
pub fn render_line_chart_svg(chart: &ChartSeries) -> Option<String> {
    let bounds = Bounds::of(chart)?;

    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"chart\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" role=\"img\" aria-label=\"{}\">",
        escape_html(&chart.title)
    ));
    out.push_str(&format!(
        "<text x=\"{MARGIN_LEFT}\" y=\"20\" font-size=\"14\" font-weight=\"700\">{}</text>",
        escape_html(&chart.title)
    ));

    let bottom = HEIGHT - MARGIN_BOTTOM;
    out.push_str(&format!(
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{bottom}\" x2=\"{}\" y2=\"{bottom}\" stroke=\"#9aa5ad\"/>",
        WIDTH - MARGIN_RIGHT
    ));
    out.push_str(&format!(
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{bottom}\" stroke=\"#9aa5ad\"/>"
    ));

    for value in [bounds.max, bounds.min] {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\">{}</text>",
            MARGIN_LEFT - 6.0,
            bounds.scale(value) + 4.0,
            format_thousands(value)
        ));
    }

    if let (Some(first), Some(last)) = (chart.x.first(), chart.x.last()) {
        out.push_str(&format!(
            "<text x=\"{MARGIN_LEFT}\" y=\"{}\" font-size=\"11\">{}</text>",
            bottom + 18.0,
            escape_html(first)
        ));
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"end\">{}</text>",
            WIDTH - MARGIN_RIGHT,
            bottom + 18.0,
            escape_html(last)
        ));
    }

    for (idx, series) in chart.series.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        for segment in segments(&series.values, &bounds) {
            let points = segment
                .iter()
                .map(|(x, y)| format!("{x:.1},{y:.1}"))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{points}\"/>"
            ));
        }
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"{color}\">{}</text>",
            MARGIN_LEFT + 180.0 * idx as f64,
            HEIGHT - 6.0,
            escape_html(&series.name)
        ));
    }

    out.push_str("</svg>");
    Some(out)
}
