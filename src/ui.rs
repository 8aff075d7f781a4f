use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{ColorScale, MapLayers, ValueRange, CLASS_COUNT};
use crate::query::{ImpactMetric, FIRST_DECADE, LAST_DECADE};

const PANEL_WIDTH: u16 = 34;
const ACCENT: Color = Color::Rgb(0x45, 0x25, 0xF2);

/// Fill colour for a value class, light to dark
pub fn class_color(scale: ColorScale, class: usize) -> Color {
    const REDS: [(u8, u8, u8); CLASS_COUNT] = [
        (254, 229, 217),
        (252, 174, 145),
        (251, 106, 74),
        (222, 45, 38),
        (165, 15, 21),
    ];
    const PURPLES: [(u8, u8, u8); CLASS_COUNT] = [
        (242, 240, 247),
        (203, 201, 226),
        (158, 154, 200),
        (117, 107, 177),
        (84, 39, 143),
    ];
    let ramp = match scale {
        ColorScale::Reds => &REDS,
        ColorScale::Purples => &PURPLES,
    };
    let (r, g, b) = ramp[class.min(CLASS_COUNT - 1)];
    Color::Rgb(r, g, b)
}

/// Compact magnitude: 950, 12.3k, 4.5M, 7.8B
pub fn format_value(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}k", value / 1e3)
    } else if abs >= 100.0 || value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Render the UI. Records the map area on `app` so mouse input lines up.
pub fn render(frame: &mut Frame, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(PANEL_WIDTH), Constraint::Min(10)])
        .split(frame.area());

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(columns[1]);

    render_panel(frame, app, columns[0]);
    render_map(frame, app, right[0]);
    render_status_bar(frame, app, right[1]);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let params = app.params();
    let view = app.view();
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        heading("Disaster Economics"),
        heading("Map Explorer"),
        Line::default(),
        heading("Disaster Selector"),
    ];

    for disaster in &app.disaster_types {
        let selected = *disaster == params.disaster_type;
        lines.push(Line::from(vec![
            Span::styled(if selected { " ● " } else { " ○ " }, Style::default().fg(ACCENT)),
            Span::styled(
                disaster.clone(),
                if selected {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    dim
                },
            ),
        ]));
    }
    if app.disaster_types.is_empty() {
        lines.push(Line::from(Span::styled(" (dataset is empty)", dim)));
    }

    lines.push(Line::default());
    lines.push(heading("Impact Selector"));
    let toggle = |metric: ImpactMetric| {
        let active = params.metric == metric;
        Span::styled(
            format!(" {} ", metric.label()),
            if active {
                Style::default().fg(Color::White).bg(ACCENT)
            } else {
                dim
            },
        )
    };
    lines.push(Line::from(vec![
        toggle(ImpactMetric::Human),
        Span::raw(" "),
        toggle(ImpactMetric::Financial),
    ]));

    lines.push(Line::default());
    lines.push(heading("Scenario"));
    lines.push(Line::from(Span::styled(format!(" {}", params.scenario), dim)));

    lines.push(Line::default());
    lines.push(heading("Decades"));
    lines.push(decade_slider(params.decades.min(), params.decades.max(), area.width));
    lines.push(Line::from(vec![
        Span::styled(format!(" {} ", params.decades.min()), Style::default().fg(Color::Cyan)),
        Span::styled("to", dim),
        Span::styled(format!(" {}", params.decades.max()), Style::default().fg(Color::Cyan)),
    ]));

    lines.push(Line::default());
    lines.push(heading("Legend"));
    match view.descriptor.value_range {
        Some(range) => lines.extend(legend(view.descriptor.color_scale, &range)),
        None => lines.push(Line::from(Span::styled(" no data", dim))),
    }
    lines.push(Line::from(Span::styled(
        format!(" {} records matched", view.matched_records),
        dim,
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Text range slider over the decade axis
fn decade_slider(min: i32, max: i32, width: u16) -> Line<'static> {
    let slots = ((LAST_DECADE - FIRST_DECADE) / 10 + 1) as usize;
    let track_width = (width as usize).saturating_sub(4).max(slots);
    let position =
        |decade: i32| ((decade - FIRST_DECADE) / 10) as usize * (track_width - 1) / (slots - 1);
    let (start, end) = (position(min), position(max));

    let track: String = (0..track_width)
        .map(|i| {
            if i == start || i == end {
                '◆'
            } else if i > start && i < end {
                '━'
            } else {
                '─'
            }
        })
        .collect();
    Line::from(Span::styled(format!(" {track}"), Style::default().fg(ACCENT)))
}

fn legend(scale: ColorScale, range: &ValueRange) -> Vec<Line<'static>> {
    (0..CLASS_COUNT)
        .rev()
        .map(|class| {
            Line::from(vec![
                Span::styled(" ███ ", Style::default().fg(class_color(scale, class))),
                Span::raw(format!("≥ {}", format_value(range.class_floor(class)))),
            ])
        })
        .collect()
}

fn render_map(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.view().caption),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    app.map_origin = (inner.x, inner.y);
    app.resize(inner.width as usize, inner.height as usize);

    let view = app.view();
    let layers = app.map_renderer.render(
        &view.descriptor,
        app.geometry(),
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
    );

    let cursor = app.mouse_pos.and_then(|(col, row)| {
        let inside = col >= inner.x
            && row >= inner.y
            && col < inner.x + inner.width
            && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    });

    let widget = MapWidget {
        layers,
        scale: view.descriptor.color_scale,
        no_data: view.descriptor.is_empty(),
        cursor,
    };
    frame.render_widget(widget, inner);
}

/// Braille choropleth with labels overlaid
struct MapWidget {
    layers: MapLayers,
    scale: ColorScale,
    no_data: bool,
    cursor: Option<(u16, u16)>,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                if let Some(ch) = canvas.cell(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn put_text(text: &str, x: u16, y: u16, style: Style, area: Rect, buf: &mut Buffer) {
        for (i, ch) in text.chars().enumerate() {
            let px = x + i as u16;
            if px >= area.x + area.width {
                break;
            }
            buf[(px, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fills first, light to dark, then outlines on top
        for (class, canvas) in self.layers.classes.iter().enumerate() {
            Self::render_layer(canvas, class_color(self.scale, class), area, buf);
        }
        Self::render_layer(&self.layers.outlines, Color::DarkGray, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            // Centre the label on its anchor
            let half = (text.chars().count() / 2) as u16;
            let x = area.x + lx.saturating_sub(half);
            Self::put_text(text, x, area.y + ly, label_style, area, buf);
        }

        if self.no_data && area.height > 0 {
            let message = " No data for this selection ";
            let x = area.x + area.width.saturating_sub(message.len() as u16) / 2;
            let y = area.y + area.height / 2;
            let style = Style::default().fg(Color::Black).bg(Color::Yellow);
            Self::put_text(message, x, y, style, area, buf);
        }

        if let Some((cx, cy)) = self.cursor {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
    ];

    match app.hovered() {
        Some((region, Some(value))) => {
            spans.push(Span::styled(region.subregion.clone(), Style::default().fg(Color::White)));
            spans.push(Span::styled(
                format!(" {} {}", format_value(value), app.params().metric.label().to_lowercase()),
                Style::default().fg(Color::Yellow),
            ));
        }
        Some((region, None)) => {
            spans.push(Span::styled(region.subregion.clone(), Style::default().fg(Color::White)));
            spans.push(Span::styled(" no data", dim));
        }
        None => spans.push(Span::styled("-", dim)),
    }

    let unresolved = app.view().descriptor.warnings.len();
    if unresolved > 0 {
        spans.push(Span::styled(
            format!(" | {unresolved} unmapped"),
            Style::default().fg(Color::Red),
        ));
    }

    spans.push(Span::styled(
        " | [ ] start { } end < > shift  d type  i impact  L labels  o outlines  hjkl +/- r q",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(15.0), "15");
        assert_eq!(format_value(2.345), "2.35");
        assert_eq!(format_value(950.4), "950");
        assert_eq!(format_value(12_345.0), "12.3k");
        assert_eq!(format_value(4_500_000.0), "4.5M");
        assert_eq!(format_value(7_800_000_000.0), "7.8B");
    }

    #[test]
    fn test_class_colors_darken() {
        for scale in [ColorScale::Reds, ColorScale::Purples] {
            let brightness = |class| match class_color(scale, class) {
                Color::Rgb(r, g, b) => r as u32 + g as u32 + b as u32,
                _ => unreachable!(),
            };
            for class in 1..CLASS_COUNT {
                assert!(brightness(class) < brightness(class - 1));
            }
        }
    }

    #[test]
    fn test_decade_slider_marks_handles() {
        let line = decade_slider(1900, 2100, 25);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text.chars().filter(|&c| c == '◆').count(), 2);
        assert!(text.trim_start().starts_with('◆'));
        assert!(text.ends_with('◆'));

        let line = decade_slider(1950, 1950, 25);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text.chars().filter(|&c| c == '◆').count(), 1);
    }
}
