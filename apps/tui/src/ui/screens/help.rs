use crate::app::state::{App, AppScreen};
use crate::ui::widgets::popup::centered_rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

fn bindings(screen: AppScreen) -> &'static [(&'static str, &'static str)] {
    match screen {
        AppScreen::Login => &[
            ("Tab", "Switch between email and password"),
            ("Enter", "Next field, then sign in"),
            ("Esc", "Quit"),
        ],
        AppScreen::Datasets => &[
            ("↑↓ PgUp PgDn", "Move selection"),
            ("Enter", "Open the dataset dashboard"),
            ("/", "Fuzzy search by file name"),
            ("u", "Upload survey files"),
            ("g", "Generate charts for the selected dataset"),
            ("d", "Delete the selected dataset"),
            ("r", "Reload datasets and chart counts"),
            ("a", "Admin view (staff only)"),
            ("L", "Sign out"),
            ("q", "Quit"),
        ],
        AppScreen::Dashboard => &[
            ("Tab ←→", "Focus a filter"),
            ("Enter Space", "Open the filter dropdown"),
            ("c", "Clear all filters"),
            ("↑↓", "Select a respondent"),
            ("m", "Load more respondents"),
            ("r", "Reload summary charts"),
            ("g", "Regenerate charts"),
            ("Esc", "Back to datasets"),
        ],
        AppScreen::Upload => &[
            ("Enter", "Queue the typed paths, or upload when empty"),
            ("Esc", "Back to datasets"),
        ],
        AppScreen::Admin => &[
            ("↑↓", "Select a user"),
            ("Enter", "Show the user's datasets and charts"),
            ("r", "Reload users"),
            ("Esc", "Back to datasets"),
        ],
        AppScreen::AdminUser => &[("Tab", "Switch tab"), ("Esc", "Back to users")],
    }
}

pub fn render_help(app: &App, f: &mut Frame<'_>) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let mut lines: Vec<TextLine<'_>> = bindings(app.screen)
        .iter()
        .map(|(key, action)| {
            TextLine::from(vec![
                Span::styled(
                    format!("{key:>14}  "),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ])
        })
        .collect();
    lines.push(TextLine::from(""));
    lines.push(TextLine::from(Span::styled(
        "?: toggle help",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}
