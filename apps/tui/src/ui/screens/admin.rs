use crate::app::App;
use crate::ui::widgets::status::{render_footer, render_spinner};
use crate::ui::widgets::tables::scroll_offset;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use ratatui::Frame;

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn render_admin(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let block = Block::default()
        .title(format!("Users ({})", app.admin.users.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.admin.loading {
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);
        render_spinner(f, inner, "Loading users...", &app.throbber);
    } else {
        let max_visible_rows = chunks[0].height.saturating_sub(3) as usize;
        let offset = scroll_offset(app.admin.users.len(), max_visible_rows, app.admin.selected);
        let rows = app
            .admin
            .users
            .iter()
            .enumerate()
            .skip(offset)
            .take(max_visible_rows)
            .map(|(index, user)| {
                let style = if index == app.admin.selected {
                    Style::default()
                        .bg(Color::Rgb(0, 0, 238))
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else if user.is_active {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Row::new(vec![
                    Cell::from(user.email.clone()),
                    Cell::from(user.full_name.clone()),
                    Cell::from(yes_no(user.is_staff)),
                    Cell::from(yes_no(user.is_active)),
                    Cell::from(user.dataset_count.to_string()),
                    Cell::from(user.chart_count.to_string()),
                ])
                .style(style)
            });

        let header = Row::new(vec!["Email", "Name", "Staff", "Active", "Datasets", "Charts"])
            .style(header_style());
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(25),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(9),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .block(block)
        .column_spacing(1);
        f.render_widget(table, chunks[0]);
    }

    render_footer(
        f,
        chunks[1],
        &app.status_message,
        &[("↑↓", "Select"), ("Enter", "Open"), ("r", "Reload"), ("Esc", "Back")],
    );
}

pub fn render_admin_user(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let listed = app.admin.users.get(app.admin.selected);
    let title = app
        .admin
        .detail
        .as_ref()
        .map(|(datasets, _)| datasets.user.email.clone())
        .or_else(|| listed.map(|user| user.email.clone()))
        .unwrap_or_default();
    let header = Block::default()
        .title(format!("User · {title}"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = header.inner(chunks[0]);
    f.render_widget(header, chunks[0]);

    if app.admin.loading {
        render_spinner(f, inner, "Loading user data...", &app.throbber);
    } else if let Some((datasets, charts)) = &app.admin.detail {
        let name = if datasets.user.full_name.is_empty() {
            "-".to_string()
        } else {
            datasets.user.full_name.clone()
        };
        f.render_widget(
            Paragraph::new(format!(
                "{name} · {} datasets · {} charts",
                datasets.datasets.len(),
                charts.charts.len()
            )),
            inner,
        );
    }

    let tabs = Tabs::new(vec![TextLine::from("Datasets"), TextLine::from("Charts")])
        .select(app.admin.chart_tab)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(0, 0, 238))
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::raw("|"));
    f.render_widget(tabs, chunks[1]);

    if app.admin.chart_tab == 0 {
        render_user_datasets(app, f, chunks[2]);
    } else {
        render_user_charts(app, f, chunks[2]);
    }

    render_footer(
        f,
        chunks[3],
        &app.status_message,
        &[("Tab", "Switch tab"), ("Esc", "Back")],
    );
}

fn render_user_datasets(app: &App, f: &mut Frame<'_>, area: Rect) {
    let datasets = app
        .admin
        .detail
        .as_ref()
        .map_or(&[][..], |(datasets, _)| datasets.datasets.as_slice());
    let rows = datasets.iter().map(|dataset| {
        Row::new(vec![
            Cell::from(dataset.filename.clone()),
            Cell::from(dataset.row_count.to_string()),
            Cell::from(yes_no(dataset.parsed_ok)),
            Cell::from(
                dataset
                    .created_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(24),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(11),
        ],
    )
    .header(Row::new(vec!["File", "Rows", "Parsed", "Uploaded"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL))
    .column_spacing(1);
    f.render_widget(table, area);
}

fn render_user_charts(app: &App, f: &mut Frame<'_>, area: Rect) {
    let charts = app
        .admin
        .detail
        .as_ref()
        .map_or(&[][..], |(_, charts)| charts.charts.as_slice());
    let rows = charts.iter().map(|chart| {
        Row::new(vec![
            Cell::from(chart.kind().label().to_string()),
            Cell::from(chart.title().to_string()),
            Cell::from(yes_no(chart.is_canonical)),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Min(24),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["Type", "Title", "Canonical"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL))
    .column_spacing(1);
    f.render_widget(table, area);
}
