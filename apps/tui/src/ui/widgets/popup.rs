use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use taam_dashboard::confirm::ConfirmState;

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Delete confirmation, working and failure states.
pub fn render_confirm(f: &mut Frame<'_>, state: &ConfirmState) {
    let (title, body, color) = match state {
        ConfirmState::Closed => return,
        ConfirmState::Confirming(target) => (
            "Delete dataset",
            vec![
                TextLine::from(format!("Delete \"{}\" and all of its charts?", target.label)),
                TextLine::from(""),
                TextLine::from("y: Delete   n: Cancel"),
            ],
            Color::Yellow,
        ),
        ConfirmState::Working(target) => (
            "Deleting",
            vec![TextLine::from(format!("Deleting \"{}\"...", target.label))],
            Color::Cyan,
        ),
        ConfirmState::Failed(target, message) => (
            "Delete failed",
            vec![
                TextLine::from(format!("Could not delete \"{}\":", target.label)),
                TextLine::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                TextLine::from(""),
                TextLine::from("y: Retry   n: Close"),
            ],
            Color::Red,
        ),
    };

    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(body)
        .wrap(Wrap { trim: true })
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(paragraph, area);
}

/// Option list for a filter dropdown.
pub fn render_dropdown(f: &mut Frame<'_>, title: &str, options: &[String], cursor: usize) {
    let area = centered_rect(40, 50, f.area());
    f.render_widget(Clear, area);

    let items: Vec<ListItem<'_>> = std::iter::once("All".to_string())
        .chain(options.iter().cloned())
        .map(ListItem::new)
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(0, 0, 238))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(cursor));
    f.render_stateful_widget(list, area, &mut state);
}
