//! The data table view.

use super::format::{format_cell, format_timestamp};
use super::Render;
use crate::source::DataSnapshot;

/// Message shown instead of a table when a snapshot has no rows.
pub const EMPTY_MESSAGE: &str = "Nenhum registro encontrado.";

/// Rendered data table plus its "last updated" label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub body: TableBody,
    /// Local time of the backend's last update, or `-`.
    pub last_updated: String,
}

/// Table contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// The snapshot had no rows; shows [`EMPTY_MESSAGE`].
    Empty,
    /// Header and stringified cells. Every row has `columns.len()` cells.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl TableView {
    /// Columns of the table; empty for the empty state.
    pub fn columns(&self) -> &[String] {
        match &self.body {
            TableBody::Empty => &[],
            TableBody::Rows { columns, .. } => columns,
        }
    }

    pub fn row_count(&self) -> usize {
        match &self.body {
            TableBody::Empty => 0,
            TableBody::Rows { rows, .. } => rows.len(),
        }
    }

    /// Label shown next to the status indicator.
    pub fn last_updated_label(&self) -> String {
        format!("Última atualização: {}", self.last_updated)
    }
}

impl Render for TableView {
    type Snapshot = DataSnapshot;

    fn render(snapshot: &DataSnapshot) -> Self {
        let last_updated = format_timestamp(snapshot.last_updated);

        if snapshot.rows.is_empty() {
            return Self {
                body: TableBody::Empty,
                last_updated,
            };
        }

        // Columns come from the first row and are assumed uniform.
        let columns = snapshot.columns();
        let rows = snapshot
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| row.get(col).map(format_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            body: TableBody::Rows { columns, rows },
            last_updated,
        }
    }
}
