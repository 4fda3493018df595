use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line as TextLine;
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use taam_dashboard::domain::{AxisValue, ChartRecord};

/// Scale ceiling when the chart does not carry its own `domain`.
const DEFAULT_DOMAIN_MAX: f64 = 5.0;

pub fn persona_color(code: &str) -> Color {
    match code {
        "A" => Color::Cyan,
        "B" => Color::Green,
        "C" => Color::Magenta,
        "D" => Color::Blue,
        "E" => Color::Yellow,
        "F" => Color::LightBlue,
        "G" => Color::LightMagenta,
        "H" => Color::LightRed,
        "I" => Color::LightYellow,
        "J" => Color::LightGreen,
        _ => Color::Gray,
    }
}

fn domain_max(record: &ChartRecord) -> f64 {
    record
        .chart_config
        .extra
        .get("domain")
        .and_then(|domain| domain.as_array())
        .and_then(|bounds| bounds.last())
        .and_then(serde_json::Value::as_f64)
        .filter(|max| *max > 0.0)
        .unwrap_or(DEFAULT_DOMAIN_MAX)
}

/// Axis names in drawing order: the configured list, or the series order.
pub fn radar_axes(record: &ChartRecord) -> Vec<String> {
    let config = &record.chart_config;
    if !config.axes.is_empty() {
        return config.axes.clone();
    }
    config
        .user_data
        .iter()
        .chain(&config.canonical_data)
        .fold(Vec::new(), |mut axes, point| {
            if !axes.contains(&point.axis) {
                axes.push(point.axis.clone());
            }
            axes
        })
}

/// Unit-circle coordinates of `series`, first axis at twelve o'clock and the
/// rest clockwise. Axes missing from the series sit at the centre.
pub fn radar_points(series: &[AxisValue], axes: &[String], scale_max: f64) -> Vec<(f64, f64)> {
    #[allow(clippy::cast_precision_loss)]
    let step = std::f64::consts::TAU / axes.len().max(1) as f64;

    axes.iter()
        .enumerate()
        .map(|(index, axis)| {
            let value = series
                .iter()
                .find(|point| &point.axis == axis)
                .map_or(0.0, |point| point.value);
            let radius = (value / scale_max).clamp(0.0, 1.0);
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::FRAC_PI_2 - step * index as f64;
            (angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

fn draw_polygon(ctx: &mut Context<'_>, points: &[(f64, f64)], color: Color) {
    for (index, (x1, y1)) in points.iter().enumerate() {
        let (x2, y2) = points[(index + 1) % points.len()];
        ctx.draw(&CanvasLine {
            x1: *x1,
            y1: *y1,
            x2,
            y2,
            color,
        });
    }
}

/// Observed answers against the canonical persona profile.
pub fn render_persona_radar(f: &mut Frame<'_>, area: Rect, record: Option<&ChartRecord>) {
    let Some(record) = record else {
        let paragraph = Paragraph::new("Select a respondent")
            .alignment(ratatui::layout::Alignment::Center)
            .block(Block::default().title("Radar").borders(Borders::ALL));
        f.render_widget(paragraph, area);
        return;
    };

    let code = record
        .chart_config
        .persona_code
        .clone()
        .or_else(|| record.derived_metrics.persona_code.clone())
        .unwrap_or_default();
    let color = persona_color(&code);
    let axes = radar_axes(record);
    let scale_max = domain_max(record);
    let observed = radar_points(&record.chart_config.user_data, &axes, scale_max);
    let canonical = radar_points(&record.chart_config.canonical_data, &axes, scale_max);
    let grid: Vec<Vec<(f64, f64)>> = (1..=4)
        .map(|ring| {
            let level = scale_max * f64::from(ring) / 4.0;
            let ring_points: Vec<AxisValue> = axes
                .iter()
                .map(|axis| AxisValue {
                    axis: axis.clone(),
                    value: level,
                    percent: None,
                })
                .collect();
            radar_points(&ring_points, &axes, scale_max)
        })
        .collect();

    let block = Block::default()
        .title(record.title().to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .paint(|ctx| {
            for ring in &grid {
                draw_polygon(ctx, ring, Color::DarkGray);
            }
            if let Some(outer) = grid.last() {
                for ((x, y), axis) in outer.iter().zip(&axes) {
                    ctx.draw(&CanvasLine {
                        x1: 0.0,
                        y1: 0.0,
                        x2: *x,
                        y2: *y,
                        color: Color::DarkGray,
                    });
                    ctx.print(x * 1.12, y * 1.12, TextLine::from(axis.clone()));
                }
            }
            ctx.layer();
            if !canonical.is_empty() && !record.chart_config.canonical_data.is_empty() {
                draw_polygon(ctx, &canonical, Color::Gray);
            }
            if !record.chart_config.user_data.is_empty() {
                draw_polygon(ctx, &observed, color);
            }
        })
        .x_bounds([-1.4, 1.4])
        .y_bounds([-1.25, 1.25]);

    f.render_widget(canvas, area);
}
