use anyhow::Context;
use plotters::prelude::*;

use super::escape_xml;
use super::format::{format_axis_value, format_month_tick, format_tooltip_value};
use super::palette::{color_for, legend_name};
use crate::models::ChartRow;

pub const CHART_TITLE: &str = "Blockchain Gas Fees";
pub const CHART_SIZE: (u32, u32) = (1200, 700);

const BACKGROUND: RGBColor = RGBColor(0x1a, 0x1a, 0x1a);
const LEGEND_BACKGROUND: RGBColor = RGBColor(0x2a, 0x2a, 0x2a);
const GRID: RGBColor = RGBColor(60, 60, 60);

/// One blockchain's slice of one month's bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub month_index: usize,
    pub blockchain: String,
    pub value: f64,
    pub bottom: f64,
    pub top: f64,
}

/// Series drawn, in stacking order: the blockchain keys of the first row.
pub fn series_keys(rows: &[ChartRow]) -> Vec<String> {
    rows.first()
        .map(|row| row.blockchains().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn stack_segments(rows: &[ChartRow], series: &[String]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(rows.len() * series.len());
    for (month_index, row) in rows.iter().enumerate() {
        let mut base = 0.0;
        for blockchain in series {
            let value = row.value(blockchain);
            segments.push(Segment {
                month_index,
                blockchain: blockchain.clone(),
                value,
                bottom: base,
                top: base + value,
            });
            base += value;
        }
    }
    segments
}

struct Hotspot {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    tooltip: String,
}

/// Draws the stacked bar chart as an SVG document.
///
/// Each visible segment gets a transparent overlay carrying a `<title>`, which browsers
/// show as a tooltip.
pub fn render_svg(rows: &[ChartRow]) -> anyhow::Result<String> {
    if rows.is_empty() {
        anyhow::bail!("[render_svg] cannot draw a chart without rows");
    }

    let mut svg = String::new();
    let hotspots = draw_chart(&mut svg, rows).context("[render_svg] drawing failed")?;

    if !hotspots.is_empty() {
        let close = svg
            .rfind("</svg>")
            .context("[render_svg] backend produced no closing svg tag")?;
        let overlay = hotspots
            .iter()
            .map(|h| {
                format!(
                    r#"<rect class="tooltip" x="{}" y="{}" width="{}" height="{}" fill="transparent" pointer-events="all"><title>{}</title></rect>"#,
                    h.left,
                    h.top,
                    (h.right - h.left).max(1),
                    (h.bottom - h.top).max(1),
                    escape_xml(&h.tooltip)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        svg.insert_str(close, &format!("{}\n", overlay));
    }

    tracing::debug!(months = rows.len(), bytes = svg.len(), "rendered chart svg");
    Ok(svg)
}

fn draw_chart(svg: &mut String, rows: &[ChartRow]) -> anyhow::Result<Vec<Hotspot>> {
    let series = series_keys(rows);
    let segments = stack_segments(rows, &series);
    let month_labels: Vec<String> = rows.iter().map(|r| format_month_tick(&r.month)).collect();

    let max_total = rows.iter().map(ChartRow::total).fold(0.0_f64, f64::max);
    let y_max = if max_total > 0.0 { max_total * 1.1 } else { 1.0 };

    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&BACKGROUND)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 24).into_font().color(&WHITE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..rows.len()).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len())
        .y_labels(8)
        .axis_style(ShapeStyle::from(&WHITE).stroke_width(1))
        .light_line_style(ShapeStyle::from(&GRID).stroke_width(1))
        .bold_line_style(ShapeStyle::from(&GRID).stroke_width(1))
        .x_label_style(("sans-serif", 14).into_font().color(&WHITE))
        .y_label_style(("sans-serif", 14).into_font().color(&WHITE))
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                month_labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .y_label_formatter(&|y| format_axis_value(*y))
        .draw()?;

    for blockchain in &series {
        let color = color_for(blockchain);
        let bars = segments
            .iter()
            .filter(|s| &s.blockchain == blockchain && s.value > 0.0)
            .map(|s| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(s.month_index), s.bottom),
                        (SegmentValue::Exact(s.month_index + 1), s.top),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                bar
            });

        chart
            .draw_series(bars)?
            .label(legend_name(blockchain))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&LEGEND_BACKGROUND)
        .border_style(&GRID)
        .label_font(("sans-serif", 14).into_font().color(&WHITE))
        .draw()?;

    let hotspots = segments
        .iter()
        .filter(|s| s.value > 0.0)
        .map(|s| {
            let (left, top) = chart.backend_coord(&(SegmentValue::Exact(s.month_index), s.top));
            let (right, bottom) =
                chart.backend_coord(&(SegmentValue::Exact(s.month_index + 1), s.bottom));
            Hotspot {
                left: left + 6,
                top,
                right: right - 6,
                bottom,
                tooltip: format!(
                    "{} / {}: {}",
                    month_labels[s.month_index],
                    legend_name(&s.blockchain),
                    format_tooltip_value(s.value)
                ),
            }
        })
        .collect();

    root.present()?;
    Ok(hotspots)
}
