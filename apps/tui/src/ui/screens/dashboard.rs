use crate::app::state::{App, DashboardView};
use crate::ui::widgets::charts::render_distribution_chart;
use crate::ui::widgets::popup::render_dropdown;
use crate::ui::widgets::radar::{persona_color, render_persona_radar};
use crate::ui::widgets::status::{render_footer, render_spinner};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use taam_dashboard::domain::{ChartRecord, FilterDimension};

const ANSWER_PREVIEW: usize = 6;

pub fn render_dashboard(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());

    let Some(dashboard) = app.dashboard.as_ref() else {
        return;
    };

    render_header(app, dashboard, f, chunks[0]);
    render_filter_bar(dashboard, f, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(body[0]);
    render_distribution_chart(
        f,
        left[0],
        dashboard.snapshot.distribution_chart(),
        dashboard.filtering,
    );
    render_summary_list(dashboard, f, left[1]);

    let right = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(body[1]);
    render_respondent_list(dashboard, f, right[0]);

    let selected = dashboard
        .snapshot
        .respondent_charts
        .get(dashboard.selected_respondent);
    let radar_split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(8)])
        .split(right[1]);
    render_persona_radar(f, radar_split[0], selected);
    render_answers(selected, f, radar_split[1]);

    render_footer(
        f,
        chunks[3],
        &app.status_message,
        &[
            ("Tab", "Filter"),
            ("Enter", "Choose"),
            ("c", "Clear filters"),
            ("↑↓", "Respondent"),
            ("m", "More"),
            ("r", "Refresh"),
            ("g", "Generate"),
            ("Esc", "Back"),
        ],
    );

    if let Some(cursor) = dashboard.dropdown {
        let dimension = dashboard.focused_dimension();
        render_dropdown(
            f,
            dimension.label(),
            dashboard.snapshot.filter_options.options(dimension),
            cursor,
        );
    }
}

fn render_header(app: &App, dashboard: &DashboardView, f: &mut Frame<'_>, area: Rect) {
    let snapshot = &dashboard.snapshot;
    let title = snapshot
        .dataset
        .as_ref()
        .map_or_else(|| dashboard.loader.dataset_id().to_string(), |d| d.filename.clone());
    let block = Block::default()
        .title(format!("Dataset · {title}"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if snapshot.loading {
        render_spinner(f, inner, "Loading charts...", &app.throbber);
        return;
    }

    let rows = snapshot.dataset.as_ref().map_or(0, |d| d.row_count);
    let mut spans = vec![
        Span::raw(format!("{rows} rows · ")),
        Span::raw(format!(
            "{} respondents loaded{}",
            snapshot.respondent_charts.len(),
            if snapshot.has_more { " (more available)" } else { "" }
        )),
    ];
    if snapshot.loading_more {
        spans.push(Span::styled(
            " · loading more",
            Style::default().fg(Color::Yellow),
        ));
    }
    if app.generating.as_deref() == Some(dashboard.loader.dataset_id()) {
        spans.push(Span::styled(
            " · generating charts",
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(TextLine::from(spans)), inner);
}

fn render_filter_bar(dashboard: &DashboardView, f: &mut Frame<'_>, area: Rect) {
    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    for (index, dimension) in FilterDimension::ALL.iter().enumerate() {
        let focused = index == dashboard.focused_filter;
        let value = dashboard.selection.get(*dimension).unwrap_or("All");
        let border = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let paragraph = Paragraph::new(value.to_string()).block(
            Block::default()
                .title(dimension.label())
                .borders(Borders::ALL)
                .border_style(border),
        );
        f.render_widget(paragraph, boxes[index]);
    }

    let (text, color) = if let Some(error) = &dashboard.filter_error {
        (error.clone(), Color::Red)
    } else if dashboard.filtering {
        ("Filtering...".to_string(), Color::Yellow)
    } else if dashboard.selection.is_empty() {
        ("No filters".to_string(), Color::DarkGray)
    } else {
        ("Filtered".to_string(), Color::Green)
    };
    let status = Paragraph::new(Span::styled(text, Style::default().fg(color)))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, boxes[3]);
}

fn render_summary_list(dashboard: &DashboardView, f: &mut Frame<'_>, area: Rect) {
    let items: Vec<ListItem<'_>> = dashboard
        .snapshot
        .summary_charts
        .iter()
        .map(|chart| {
            ListItem::new(TextLine::from(vec![
                Span::styled(
                    format!("{:<22}", chart.kind().label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(chart.title().to_string()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("Summary charts ({})", dashboard.snapshot.summary_charts.len()))
            .borders(Borders::ALL),
    );
    f.render_widget(list, area);
}

fn respondent_label(chart: &ChartRecord) -> (String, Color) {
    let code = chart
        .chart_config
        .persona_code
        .as_deref()
        .or(chart.derived_metrics.persona_code.as_deref())
        .unwrap_or("");
    let title = if chart.title().is_empty() {
        chart.uid.clone()
    } else {
        chart.title().to_string()
    };
    (title, persona_color(code))
}

fn render_respondent_list(dashboard: &DashboardView, f: &mut Frame<'_>, area: Rect) {
    let charts = &dashboard.snapshot.respondent_charts;
    let items: Vec<ListItem<'_>> = charts
        .iter()
        .map(|chart| {
            let (label, color) = respondent_label(chart);
            ListItem::new(TextLine::from(vec![
                Span::styled("● ", Style::default().fg(color)),
                Span::raw(label),
            ]))
        })
        .collect();

    let title = if charts.is_empty() {
        "Respondents".to_string()
    } else {
        format!("Respondents ({}/{})", dashboard.selected_respondent + 1, charts.len())
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(0, 0, 238))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !charts.is_empty() {
        state.select(Some(dashboard.selected_respondent));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_answers(chart: Option<&ChartRecord>, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default().title("Survey answers").borders(Borders::ALL);
    let Some(chart) = chart else {
        f.render_widget(block, area);
        return;
    };

    let mut lines: Vec<TextLine<'_>> = Vec::new();
    if let Some(name) = chart
        .chart_config
        .persona_name
        .as_deref()
        .or(chart.derived_metrics.persona_name.as_deref())
    {
        lines.push(TextLine::from(Span::styled(
            name.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    for (question, answer) in chart.derived_metrics.survey_answers.iter().take(ANSWER_PREVIEW) {
        let answer = answer
            .as_str()
            .map_or_else(|| answer.to_string(), str::to_string);
        lines.push(TextLine::from(vec![
            Span::styled(format!("{question}: "), Style::default().fg(Color::DarkGray)),
            Span::raw(answer),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}
