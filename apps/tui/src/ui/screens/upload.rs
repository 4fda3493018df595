use crate::app::App;
use crate::ui::widgets::status::{render_footer, render_spinner};
use crate::ui::widgets::tables::format_size;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table};
use ratatui::Frame;
use taam_dashboard::upload::{UploadStatus, ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES};

const fn status_color(status: &UploadStatus) -> Color {
    match status {
        UploadStatus::Pending => Color::Gray,
        UploadStatus::Uploading => Color::Yellow,
        UploadStatus::Uploaded(_) => Color::Green,
        UploadStatus::Failed(_) | UploadStatus::Rejected(_) => Color::Red,
    }
}

pub fn render_upload(app: &App, f: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    let hint = format!(
        "Paths, comma separated ({}; max {})",
        ACCEPTED_EXTENSIONS.join(", "),
        format_size(MAX_UPLOAD_BYTES)
    );
    let input = Paragraph::new(format!("{}▏", app.upload.path_input)).block(
        Block::default()
            .title(hint)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(input, chunks[0]);

    let header = Row::new(vec![
        Cell::from("File"),
        Cell::from("Size"),
        Cell::from("Status"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows = app.upload.queue.items().iter().map(|item| {
        Row::new(vec![
            Cell::from(item.file_name().to_string()),
            Cell::from(format_size(item.size)),
            Cell::from(item.status.to_string()),
        ])
        .style(Style::default().fg(status_color(&item.status)))
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Length(10),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(Block::default().title("Upload queue").borders(Borders::ALL))
    .column_spacing(1);
    f.render_widget(table, chunks[1]);

    let (finished, total) = app.upload.progress;
    let progress_block = Block::default().title("Progress").borders(Borders::ALL);
    if app.upload.running && finished == 0 {
        let inner = progress_block.inner(chunks[2]);
        f.render_widget(progress_block, chunks[2]);
        render_spinner(f, inner, "Uploading...", &app.throbber);
    } else {
        let ratio = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = finished as f64 / total as f64;
            ratio.clamp(0.0, 1.0)
        };
        let gauge = Gauge::default()
            .block(progress_block)
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(ratio)
            .label(format!("{finished}/{total}"));
        f.render_widget(gauge, chunks[2]);
    }

    render_footer(
        f,
        chunks[3],
        &app.status_message,
        &[("Enter", "Add / Start upload"), ("Esc", "Back")],
    );
}
