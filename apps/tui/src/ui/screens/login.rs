use crate::app::state::{App, LoginField};
use crate::ui::widgets::popup::centered_rect;
use crate::ui::widgets::status::{render_footer, render_spinner};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render_login(app: &App, f: &mut Frame<'_>) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(f.area());
    let area = centered_rect(50, 60, outer[0]);

    let block = Block::default()
        .title("TAAM Dashboard · Sign in")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let masked = "•".repeat(app.login.password.chars().count());
    render_field(
        f,
        rows[0],
        "Email",
        &app.login.email,
        app.login.field == LoginField::Email,
    );
    render_field(
        f,
        rows[1],
        "Password",
        &masked,
        app.login.field == LoginField::Password,
    );

    if app.login.submitting {
        render_spinner(f, rows[2], "Signing in...", &app.throbber);
    } else if let Some(error) = &app.login.error {
        let line = TextLine::from(Span::styled(error.clone(), Style::default().fg(Color::Red)));
        f.render_widget(Paragraph::new(line), rows[2]);
    }

    render_footer(
        f,
        outer[1],
        &app.status_message,
        &[("Tab", "Switch field"), ("Enter", "Next / Sign in"), ("Esc", "Quit")],
    );
}

fn render_field(
    f: &mut Frame<'_>,
    area: ratatui::layout::Rect,
    label: &str,
    value: &str,
    focused: bool,
) {
    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "▏" } else { "" };
    let paragraph = Paragraph::new(format!("{value}{cursor}")).block(
        Block::default()
            .title(label.to_string())
            .borders(Borders::ALL)
            .border_style(style),
    );
    f.render_widget(paragraph, area);
}
