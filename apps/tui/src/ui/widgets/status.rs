use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, ThrobberState, BRAILLE_SIX};

/// Footer line of `key: action` pairs.
pub fn key_hints(hints: &[(&str, &str)]) -> TextLine<'static> {
    let key_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let spans: Vec<Span<'static>> = hints
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled((*key).to_string(), key_style),
                Span::raw(format!(": {action}   ")),
            ]
        })
        .collect();
    TextLine::from(spans)
}

pub fn render_footer(f: &mut Frame<'_>, area: Rect, status: &str, hints: &[(&str, &str)]) {
    let mut lines = vec![key_hints(hints)];
    if !status.is_empty() {
        let status = Span::styled(status.to_string(), Style::default().fg(Color::Cyan));
        lines.insert(0, TextLine::from(status));
    }
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::TOP))
        .alignment(ratatui::layout::Alignment::Center);
    f.render_widget(paragraph, area);
}

pub fn render_spinner(f: &mut Frame<'_>, area: Rect, label: &str, state: &ThrobberState) {
    let throbber = Throbber::default()
        .label(label.to_string())
        .style(Style::default().fg(Color::Cyan))
        .throbber_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .throbber_set(BRAILLE_SIX);
    let mut state = state.clone();
    f.render_stateful_widget(throbber, area, &mut state);
}
