//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{column_label, App, View};
use crate::view::format::PLACEHOLDER;

/// Render the header bar.
///
/// Displays: status indicator and label, last update time, row count and
/// the filters in effect.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.table_status();
    let status_style = app.theme.status_style(status);

    let mut spans = vec![
        Span::styled(" ● ", status_style),
        Span::styled("SHEETWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(status.label(), status_style),
        Span::raw(" │ "),
    ];

    match app.table_view() {
        Some(view) => {
            spans.push(Span::raw(view.last_updated_label()));
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(
                view.row_count().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" registros"));
        }
        None => spans.push(Span::raw(format!("Última atualização: {}", PLACEHOLDER))),
    }

    let search = app.search_filter();
    let column = app.column_filter();
    if !search.is_empty() || !column.is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("/{}/ em {}", search, column_label(&column)),
            Style::default().fg(app.theme.highlight),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut titles = vec![Line::from(format!(" 1:{} ", View::Table.label()))];
    if app.stats.is_some() {
        titles.push(Line::from(format!(" 2:{} ", View::Dashboard.label())));
    }

    let selected = match app.current_view {
        View::Table => 0,
        View::Dashboard => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the search prompt while typing, otherwise temporary messages,
/// the last error or the source with time since the last render.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if app.search_active {
        let line = Line::from(vec![
            Span::styled(" /", Style::default().fg(app.theme.highlight)),
            Span::raw(format!("{}_", app.search_text)),
            Span::styled(
                " | Enter:aplicar Esc:cancelar",
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Table => "/:busca f:coluna x:limpar r:atualizar e:exportar ?:ajuda q:sair",
        View::Dashboard => "Tab:trocar r:atualizar e:exportar ?:ajuda q:sair",
    };

    if let Some(err) = app.table.last_error().filter(|_| app.table_status().is_error()) {
        let paragraph = Paragraph::new(format!(" Erro: {} | {}", err, controls))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let freshness = freshness(app.table.rendered_at(), app.table.checked_at());

    let status = format!(
        " {} | {} | {}",
        app.source_description(),
        freshness,
        controls
    );
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Atalhos", app.theme.header)]),
        Line::from(""),
        section(" Navegação"),
        Line::from("  1/2 Tab ←/→  Trocar visão"),
        Line::from("  ↑/↓ j/k      Mover seleção"),
        Line::from("  PgUp/PgDn    Pular 10 linhas"),
        Line::from("  Home/End     Primeira/última"),
        Line::from(""),
        section(" Filtros"),
        Line::from("  /            Buscar"),
        Line::from("  f            Trocar coluna"),
        Line::from("  x            Limpar filtros"),
        Line::from(""),
        section(" Geral"),
        Line::from("  r            Atualizar agora"),
        Line::from("  e            Exportar JSON"),
        Line::from("  q            Sair"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Qualquer tecla para fechar",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Ajuda ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 22u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Age of the view on screen and of the last successful check.
///
/// The two differ once cycles start coming back unchanged.
fn freshness(rendered_at: Option<Instant>, checked_at: Option<Instant>) -> String {
    let ago = |at: Instant| format!("{:.0}s", at.elapsed().as_secs_f64());
    match (rendered_at, checked_at) {
        (Some(rendered), Some(checked)) if checked > rendered => {
            format!("atualizado há {}, verificado há {}", ago(rendered), ago(checked))
        }
        (Some(rendered), _) => format!("atualizado há {}", ago(rendered)),
        (None, Some(checked)) => format!("verificado há {}", ago(checked)),
        (None, None) => "aguardando dados".to_string(),
    }
}
