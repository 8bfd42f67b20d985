//! Dashboard view rendering: summary cards, categorical top values and the
//! monthly row count chart.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::view::format::format_count;
use crate::view::{Card, DashboardView};

/// Width of a chart bar; fits a `YYYY-MM` label.
const BAR_WIDTH: u16 = 7;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.dashboard_view() else {
        let status = app
            .stats
            .as_ref()
            .map(|stats| stats.status().label())
            .unwrap_or_default();
        let paragraph = Paragraph::new(format!(" Carregando estatísticas... ({})", status))
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(panel(app, " Painel "));
        frame.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::vertical([Constraint::Length(5), Constraint::Min(6)]).split(area);
    render_cards(frame, app, &view.cards, chunks[0]);

    let lower =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
    render_categorical(frame, app, &view, lower[0]);
    render_timeseries(frame, app, &view, lower[1]);
}

fn panel<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_cards(frame: &mut Frame, app: &App, cards: &[Card], area: Rect) {
    if cards.is_empty() {
        return;
    }

    let constraints: Vec<Constraint> = cards.iter().map(|_| Constraint::Fill(1)).collect();
    let slots = Layout::horizontal(constraints).split(area);

    for (card, slot) in cards.iter().zip(slots.iter()) {
        let title = format!(" {} ", card.title);
        let paragraph = Paragraph::new(Line::from(Span::styled(
            card.value.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(title, app.theme.header))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
        frame.render_widget(paragraph, *slot);
    }
}

fn render_categorical(frame: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let mut lines = Vec::new();

    for summary in &view.categorical {
        lines.push(Line::from(vec![
            Span::styled(
                summary.column.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" (únicos: {})", summary.unique),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        for (value, count) in &summary.top {
            lines.push(Line::from(format!("  {} {}", value, format_count(*count))));
        }
        lines.push(Line::from(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sem colunas categóricas",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    let paragraph = Paragraph::new(lines).block(panel(app, " Valores mais frequentes "));
    frame.render_widget(paragraph, area);
}

fn render_timeseries(frame: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let block = panel(app, " Registros por mês ");

    // No series clears the chart instead of keeping stale bars.
    if view.timeseries.is_empty() {
        frame.render_widget(block, area);
        return;
    }

    let bars: Vec<Bar> = view
        .timeseries
        .iter()
        .map(|(period, count)| {
            Bar::default()
                .value(*count)
                .text_value(format_count(*count))
                .label(Line::from(period.clone()))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(1)
        .bar_style(Style::default().fg(app.theme.chart))
        .value_style(
            Style::default()
                .fg(app.theme.chart)
                .add_modifier(Modifier::REVERSED),
        );

    frame.render_widget(chart, area);
}
