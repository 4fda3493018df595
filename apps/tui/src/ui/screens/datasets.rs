use crate::app::App;
use crate::ui::widgets::popup::render_confirm;
use crate::ui::widgets::status::{render_footer, render_spinner};
use crate::ui::widgets::tables::{format_size, scroll_offset};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

pub fn render_datasets(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    render_header(app, f, chunks[0]);

    let datasets = app.visible_datasets();
    if datasets.is_empty() {
        let message = if app.datasets_loading {
            "Loading datasets..."
        } else if app.search_active {
            "No datasets match your search."
        } else {
            "No datasets yet. Press u to upload a survey file."
        };
        let paragraph = Paragraph::new(message)
            .block(
                Block::default()
                    .title("Datasets")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(paragraph, chunks[1]);
    } else {
        let header = Row::new(vec![
            Cell::from("File"),
            Cell::from("Rows"),
            Cell::from("Size"),
            Cell::from("Charts"),
            Cell::from("Parsed"),
            Cell::from("Uploaded"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let total_rows = datasets.len();
        let max_visible_rows = chunks[1].height.saturating_sub(3) as usize;
        let offset = scroll_offset(total_rows, max_visible_rows, app.selected_dataset_index);

        let rows = datasets
            .iter()
            .enumerate()
            .skip(offset)
            .take(max_visible_rows)
            .map(|(index, dataset)| {
                let style = if index == app.selected_dataset_index {
                    Style::default()
                        .bg(Color::Rgb(0, 0, 238))
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else if !dataset.parsed_ok {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                let charts = app.chart_counts.get(&dataset.uid).map_or_else(
                    || "-".to_string(),
                    |count| {
                        let mark = if count.has_distribution { "" } else { " (no summary)" };
                        format!("{}{mark}", count.chart_count)
                    },
                );
                let generating = app.generating.as_deref() == Some(dataset.uid.as_str());

                Row::new(vec![
                    Cell::from(dataset.filename.clone()),
                    Cell::from(dataset.row_count.to_string()),
                    Cell::from(format_size(dataset.size_bytes)),
                    Cell::from(if generating { "generating…".to_string() } else { charts }),
                    Cell::from(if dataset.parsed_ok { "Yes" } else { "No" }),
                    Cell::from(
                        dataset
                            .created_at
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                    ),
                ])
                .style(style)
            });

        let widths = [
            Constraint::Min(24),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Length(7),
            Constraint::Length(17),
        ];

        let title = if app.search_active {
            format!("Datasets · search: {}▏", app.search_query)
        } else {
            format!("Datasets ({} of {})", app.selected_dataset_index + 1, total_rows)
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title(title).borders(Borders::ALL))
            .column_spacing(1);
        f.render_widget(table, chunks[1]);
    }

    let mut hints = vec![
        ("Enter", "Open"),
        ("/", "Search"),
        ("u", "Upload"),
        ("g", "Generate"),
        ("d", "Delete"),
        ("r", "Refresh"),
    ];
    if app.is_staff() {
        hints.push(("a", "Admin"));
    }
    hints.extend([("L", "Sign out"), ("?", "Help"), ("q", "Quit")]);
    render_footer(f, chunks[2], &app.status_message, &hints);

    render_confirm(f, app.confirm.state());
}

fn render_header(app: &App, f: &mut Frame<'_>, area: ratatui::layout::Rect) {
    let who = app
        .user
        .as_ref()
        .map_or_else(String::new, |user| format!("Signed in as {}", user.display_name()));
    let block = Block::default()
        .title("TAAM Dashboard")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.datasets_loading || app.generating.is_some() {
        let label = if app.generating.is_some() {
            format!("{who} · generating charts")
        } else {
            format!("{who} · loading")
        };
        render_spinner(f, inner, &label, &app.throbber);
    } else {
        f.render_widget(Paragraph::new(who), inner);
    }
}
