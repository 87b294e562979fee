//! Inline SVG charts for the HTML report and the web page.

use askama::{Html, MarkupDisplay};

use crate::domain::price_table::PriceTable;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 320.0;
const PADDING: f64 = 48.0;
const SERIES_COLOURS: &[&str] = &["#2563eb", "#f97316", "#16a34a", "#9333ea"];
const POSITIVE_FILL: &str = "#2563eb";
const NEGATIVE_FILL: &str = "#ef4444";

fn escape(text: &str) -> MarkupDisplay<Html, &str> {
    MarkupDisplay::new_unsafe(text, Html)
}

fn empty_chart(message: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}"><text x="{x:.0}" y="{y:.0}" text-anchor="middle" fill="#6b7280">{msg}</text></svg>"##,
        w = WIDTH,
        h = HEIGHT,
        x = WIDTH / 2.0,
        y = HEIGHT / 2.0,
        msg = escape(message),
    )
}

/// Vertical bars on a fixed -1..1 axis, in the order given.
pub fn generate_bar_chart_svg(ranked: &[(&str, f64)]) -> String {
    if ranked.is_empty() {
        return empty_chart("No correlations to chart.");
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let zero_y = PADDING + plot_height / 2.0;
    let slot = plot_width / ranked.len() as f64;
    let bar_width = slot * 0.7;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = WIDTH,
        h = HEIGHT,
    );

    for tick in [-1.0_f64, -0.5, 0.0, 0.5, 1.0] {
        let y = zero_y - tick * plot_height / 2.0;
        svg.push_str(&format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#e5e7eb"/><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.1}</text>"##,
            PADDING,
            y,
            WIDTH - PADDING,
            y,
            PADDING - 6.0,
            y + 3.0,
            tick
        ));
    }

    for (i, (label, value)) in ranked.iter().enumerate() {
        let v = value.clamp(-1.0, 1.0);
        let bar_height = v.abs() * plot_height / 2.0;
        let x = PADDING + i as f64 * slot + (slot - bar_width) / 2.0;
        let y = if v >= 0.0 { zero_y - bar_height } else { zero_y };
        let fill = if v >= 0.0 { POSITIVE_FILL } else { NEGATIVE_FILL };
        let centre = x + bar_width / 2.0;
        let value_y = if v >= 0.0 { y - 4.0 } else { y + bar_height + 12.0 };

        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x, y, bar_width, bar_height, fill
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="middle">{:.2}</text>"#,
            centre, value_y, value
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
            centre,
            HEIGHT - PADDING / 3.0,
            escape(label)
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#111827"/>"##,
        PADDING,
        zero_y,
        WIDTH - PADDING,
        zero_y
    ));
    svg.push_str("</svg>");
    svg
}

/// One polyline per column. Gaps break the line rather than bridging it.
pub fn generate_line_chart_svg(table: &PriceTable) -> String {
    let values = table
        .columns()
        .iter()
        .flat_map(|c| c.values.iter().flatten().copied());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return empty_chart("No price data available.");
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let range = max - min;
    let scale_y = if range > 0.0 {
        plot_height / range
    } else {
        1.0
    };
    let rows = table.row_count();
    let scale_x = if rows > 1 {
        plot_width / (rows - 1) as f64
    } else {
        0.0
    };

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = WIDTH,
        h = HEIGHT,
    );
    svg.push_str(&format!(
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#d1d5db"/>"##,
        PADDING, PADDING, plot_width, plot_height
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.2}</text><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.2}</text>"#,
        PADDING - 6.0,
        PADDING + 3.0,
        max,
        PADDING - 6.0,
        HEIGHT - PADDING + 3.0,
        min
    ));
    if let (Some(first), Some(last)) = (table.dates().first(), table.dates().last()) {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="10">{}</text><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{}</text>"#,
            PADDING,
            HEIGHT - PADDING + 16.0,
            first,
            WIDTH - PADDING,
            HEIGHT - PADDING + 16.0,
            last
        ));
    }

    for (index, column) in table.columns().iter().enumerate() {
        let colour = SERIES_COLOURS[index % SERIES_COLOURS.len()];

        let mut segments: Vec<Vec<String>> = vec![Vec::new()];
        for (i, value) in column.values.iter().enumerate() {
            match value {
                Some(v) => {
                    let x = PADDING + i as f64 * scale_x;
                    let y = HEIGHT - PADDING - (v - min) * scale_y;
                    if let Some(segment) = segments.last_mut() {
                        segment.push(format!("{:.1},{:.1}", x, y));
                    }
                }
                None => segments.push(Vec::new()),
            }
        }

        for segment in segments.iter().filter(|s| !s.is_empty()) {
            svg.push_str(&format!(
                r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                colour,
                segment.join(" ")
            ));
        }

        let legend_y = PADDING / 2.0;
        let legend_x = PADDING + index as f64 * 140.0;
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="12" height="3" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
            legend_x,
            legend_y - 3.0,
            colour,
            legend_x + 16.0,
            legend_y + 1.0,
            escape(&column.symbol)
        ));
    }

    svg.push_str("</svg>");
    svg
}
