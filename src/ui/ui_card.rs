/*
 * This file is part of Pulseboard.
 *
 * Copyright (C) 2025 Pulseboard contributors
 *
 * Pulseboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pulseboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pulseboard. If not, see <https://www.gnu.org/licenses/>.
 */

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Sparkline},
    Frame,
};

use crate::api::SeriesPoint;
use crate::card::{CardMode, EditField, EditSession, MetricCard, Summary};
use crate::catalog::Catalog;
use crate::grid::CardState;

pub const ACCENT: Color = Color::Rgb(20, 184, 166);
const BUTTON: Color = Color::Rgb(17, 159, 151);

/// Everything needed to draw one card.
pub struct CardView<'a> {
    pub state: &'a CardState,
    pub card: &'a MetricCard,
    pub catalog: &'a Catalog,
    pub focused: bool,
    pub signed_arrow: bool,
}

pub fn render_card(f: &mut Frame, area: Rect, view: &CardView) {
    let border = if view.focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title = match view.card.mode() {
        CardMode::Edit(_) => format!(" Edit card {} ", view.state.id),
        CardMode::View => format!(" {} ", view.state.display_name),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    match (view.card.mode(), view.card.series()) {
        (CardMode::Edit(session), _) => render_edit(f, inner, session, view.catalog),
        (CardMode::View, Some(series)) => render_loaded(f, inner, series, view.signed_arrow),
        (CardMode::View, None) => render_placeholder(f, inner),
    }
    render_add_markers(f, area, view.focused);
}

fn render_placeholder(f: &mut Frame, area: Rect) {
    let fill: Vec<Line> = (0..area.height)
        .map(|_| Line::from("░".repeat(area.width as usize)))
        .collect();
    let p = Paragraph::new(fill).style(Style::default().fg(Color::DarkGray));
    f.render_widget(p, area);
}

fn render_loaded(f: &mut Frame, area: Rect, series: &[SeriesPoint], signed_arrow: bool) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let summary = Summary::from_series(series);
    let top_pad = cols[0].height.saturating_sub(2) / 2;
    let mut lines: Vec<Line> = (0..top_pad).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(
        summary.latest_label(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::raw(summary.delta_label(signed_arrow)),
        Span::styled(" Δ7d", Style::default().fg(Color::Gray)),
    ]));
    f.render_widget(Paragraph::new(lines), cols[0]);

    let chart = cols[1];
    let width = chart.width as usize;
    let tail = &series[series.len().saturating_sub(width)..];
    let data = scale_series(tail);
    let sparkline = Sparkline::default()
        .data(&data)
        .style(Style::default().fg(ACCENT));
    f.render_widget(sparkline, chart);
    fade_left(f, chart);
}

/// Dim the left third of `area` so the chart fades into the card.
fn fade_left(f: &mut Frame, area: Rect) {
    let fade_width = area.width / 3;
    let buf = f.buffer_mut();
    for x in area.x..area.x + fade_width {
        for y in area.y..area.y + area.height {
            if let Some(cell) = buf.cell_mut((x, y)) {
                let style = if x < area.x + fade_width / 2 {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                };
                cell.set_style(style);
            }
        }
    }
}

fn render_edit(f: &mut Frame, area: Rect, session: &EditSession, catalog: &Catalog) {
    let metric = catalog
        .metrics
        .get(session.metric_idx)
        .map(|m| m.display_name.clone())
        .unwrap_or_else(|| "Select Metric".to_string());
    let segments = catalog.flattened_segments();
    let segment = segments
        .get(session.segment_idx)
        .map(|v| v.display_name.clone())
        .unwrap_or_else(|| "Select Segment".to_string());

    let selector = |label: &str, value: String, active: bool| -> Vec<Line<'static>> {
        let style = if active {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else {
            Style::default().add_modifier(Modifier::UNDERLINED)
        };
        vec![
            Line::from(Span::styled(label.to_string(), Style::default().fg(Color::Gray))),
            Line::from(Span::styled(format!("‹ {} ›", value), style)),
        ]
    };

    let mut lines = selector("Metric", metric, session.field == EditField::Metric);
    lines.extend(selector("Segment", segment, session.field == EditField::Segment));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" Cancel (Esc) ", Style::default().fg(Color::Red).bg(Color::Rgb(254, 202, 202))),
        Span::raw("  "),
        Span::styled(" Add (Enter) ", Style::default().fg(Color::White).bg(BUTTON)),
    ]));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_add_markers(f: &mut Frame, area: Rect, focused: bool) {
    if area.width < 2 || area.height == 0 {
        return;
    }
    let mid = area.y + area.height / 2;
    let style = if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let buf = f.buffer_mut();
    for x in [area.x, area.x + area.width - 1] {
        if let Some(cell) = buf.cell_mut((x, mid)) {
            cell.set_symbol("+");
            cell.set_style(style);
        }
    }
}

/// Bar heights for the sparkline: zero-based, relative to the series max.
/// Negative values draw as empty bars.
pub fn scale_series(series: &[SeriesPoint]) -> Vec<u64> {
    let max = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if max <= 0.0 || !max.is_finite() {
        return vec![0; series.len()];
    }
    series
        .iter()
        .map(|p| ((p.value.max(0.0) / max) * 1000.0).round() as u64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::series;

    #[test]
    fn test_scale_series_relative_to_max() {
        assert_eq!(scale_series(&series(&[0.0, 50.0, 100.0])), vec![0, 500, 1000]);
        assert_eq!(scale_series(&series(&[-5.0, 10.0])), vec![0, 1000]);
    }

    #[test]
    fn test_scale_series_flat_or_empty() {
        assert_eq!(scale_series(&series(&[0.0, 0.0])), vec![0, 0]);
        assert_eq!(scale_series(&series(&[-1.0])), vec![0]);
        assert!(scale_series(&[]).is_empty());
    }
}
