//! Table view rendering.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{column_label, App};
use crate::view::{table::EMPTY_MESSAGE, TableBody};

/// Render the most recent table render, or the empty-state indicator.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = |title: String| {
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border))
    };

    let Some(view) = app.table_view() else {
        let paragraph = Paragraph::new(" Carregando...")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block(" Dados ".to_string()));
        frame.render_widget(paragraph, area);
        return;
    };

    let (columns, rows) = match &view.body {
        TableBody::Empty => {
            let paragraph = Paragraph::new(format!(" {}", EMPTY_MESSAGE))
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(block(title(app, 0, 0)));
            frame.render_widget(paragraph, area);
            return;
        }
        TableBody::Rows { columns, rows } => (columns, rows),
    };

    let filtered = app.column_filter();
    let header = Row::new(columns.iter().map(|name| {
        let style = if !filtered.is_empty() && *name == filtered {
            Style::default().add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        Cell::from(name.clone()).style(style)
    }))
    .height(1)
    .style(app.theme.header);

    let body: Vec<Row> = rows
        .iter()
        .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.clone()))))
        .collect();

    let widths: Vec<Constraint> = columns.iter().map(|_| Constraint::Fill(1)).collect();

    let selected = app.selected_row.min(rows.len().saturating_sub(1));

    let table = Table::new(body, widths)
        .header(header)
        .block(block(title(app, selected + 1, rows.len())))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn title(app: &App, position: usize, total: usize) -> String {
    let search = app.search_filter();
    let column = app.column_filter();

    let filter_info = if !search.is_empty() {
        format!(" /{}/ em {} [x:limpar]", search, column_label(&column))
    } else if !column.is_empty() {
        format!(" coluna: {} [x:limpar]", column)
    } else {
        String::new()
    };

    let position_info = if total > 0 {
        format!(" [{}/{}]", position, total)
    } else {
        String::new()
    };

    format!(" Dados ({}){}{} ", total, filter_info, position_info)
}
