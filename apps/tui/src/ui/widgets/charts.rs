use crate::ui::widgets::radar::persona_color;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line as TextLine;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};
use ratatui::Frame;
use taam_dashboard::domain::{persona_code_for, ChartRecord, PersonaShare, PERSONAS};

/// Bars in persona order A..J, then any persona the table does not know.
pub fn distribution_bars(record: &ChartRecord) -> Vec<(String, String, PersonaShare)> {
    let shares = &record.derived_metrics.persona_distribution;
    let mut bars: Vec<(String, String, PersonaShare)> = PERSONAS
        .iter()
        .filter_map(|(code, name)| {
            shares
                .get(*name)
                .or_else(|| shares.get(*code))
                .map(|share| ((*code).to_string(), (*name).to_string(), *share))
        })
        .collect();

    for (name, share) in shares {
        if persona_code_for(name).is_none() {
            bars.push((name.clone(), name.clone(), *share));
        }
    }
    bars
}

pub fn render_distribution_chart(
    f: &mut Frame<'_>,
    area: Rect,
    record: Option<&ChartRecord>,
    filtering: bool,
) {
    let Some(record) = record else {
        let paragraph = Paragraph::new("No distribution chart. Press g to generate charts.")
            .alignment(ratatui::layout::Alignment::Center)
            .block(
                Block::default()
                    .title("Persona Distribution")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(paragraph, area);
        return;
    };

    let entries = distribution_bars(record);
    let bars: Vec<Bar<'_>> = entries
        .iter()
        .map(|(code, _, share)| {
            Bar::default()
                .value(share.count)
                .label(TextLine::from(code.clone()))
                .text_value(format!("{:.1}%", share.percentage))
                .style(Style::default().fg(persona_color(code)))
                .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        })
        .collect();

    let max_value = entries
        .iter()
        .map(|(_, _, share)| share.count)
        .max()
        .unwrap_or(0)
        .max(1);

    let total = record
        .derived_metrics
        .total_respondents
        .map_or_else(String::new, |total| format!(" · {total} respondents"));
    let title = format!(
        "{}{total}{}",
        record.title(),
        if filtering { " (filtering…)" } else { "" }
    );

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(1)
        .bar_width(5);

    f.render_widget(chart, area);
}
