//! Application state and navigation logic.

use anyhow::Result;

use crate::poller::{PollerHandle, Status};
use crate::source::QueryHandle;
use crate::ui::Theme;
use crate::view::{DashboardView, TableBody, TableView};

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The data table.
    Table,
    /// Summary statistics.
    Dashboard,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Table => View::Dashboard,
            View::Dashboard => View::Table,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide.
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Table => "Tabela",
            View::Dashboard => "Painel",
        }
    }
}

/// A refresh the main loop should run on the async runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    Table { force: bool },
    Stats,
}

/// Main application state.
///
/// The app never talks to the network itself: it reads poller handles and
/// queues [`RefreshRequest`]s that the main loop dispatches.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Pollers
    pub table: PollerHandle<TableView>,
    pub stats: Option<PollerHandle<DashboardView>>,
    source_description: String,
    query: QueryHandle,
    pending_refreshes: Vec<RefreshRequest>,

    // Navigation state
    pub selected_row: usize,

    // Columns of the last table that had rows
    known_columns: Vec<String>,

    // Search input
    pub search_text: String,
    pub search_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, std::time::Instant)>,
}

impl App {
    /// Create a new App reading the given pollers.
    ///
    /// `query` must be the handle of the table poller's source so that
    /// search and column filters reach the next fetch.
    pub fn new(
        table: PollerHandle<TableView>,
        stats: Option<PollerHandle<DashboardView>>,
        query: QueryHandle,
        source_description: impl Into<String>,
    ) -> Self {
        Self::with_theme(table, stats, query, source_description, Theme::auto_detect())
    }

    /// Like [`App::new`] with an explicit theme (skips terminal detection).
    pub fn with_theme(
        table: PollerHandle<TableView>,
        stats: Option<PollerHandle<DashboardView>>,
        query: QueryHandle,
        source_description: impl Into<String>,
        theme: Theme,
    ) -> Self {
        let search_text = query.get().search;
        let mut app = Self {
            running: true,
            current_view: View::Table,
            show_help: false,
            table,
            stats,
            source_description: source_description.into(),
            query,
            pending_refreshes: Vec::new(),
            selected_row: 0,
            search_text,
            search_active: false,
            theme,
            status_message: None,
            known_columns: Vec::new(),
        };
        app.remember_columns();
        app
    }

    /// Returns a description of the table source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, std::time::Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < std::time::Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// The table currently on screen.
    pub fn table_view(&self) -> Option<std::sync::Arc<TableView>> {
        self.table.view()
    }

    /// The dashboard currently on screen.
    pub fn dashboard_view(&self) -> Option<std::sync::Arc<DashboardView>> {
        self.stats.as_ref().and_then(|stats| stats.view())
    }

    /// Status of the table poller.
    pub fn table_status(&self) -> Status {
        self.table.status()
    }

    /// Column filter in effect; empty means all columns.
    pub fn column_filter(&self) -> String {
        self.query.get().column
    }

    /// Search filter in effect.
    pub fn search_filter(&self) -> String {
        self.query.get().search
    }

    // Refresh requests

    /// Drain refresh requests queued since the last call.
    pub fn take_refresh_requests(&mut self) -> Vec<RefreshRequest> {
        std::mem::take(&mut self.pending_refreshes)
    }

    fn request(&mut self, request: RefreshRequest) {
        if !self.pending_refreshes.contains(&request) {
            self.pending_refreshes.push(request);
        }
    }

    /// Force a refresh of every poller (user pressed reload).
    pub fn refresh_all(&mut self) {
        self.request(RefreshRequest::Table { force: true });
        if self.stats.is_some() {
            self.request(RefreshRequest::Stats);
        }
        self.set_status_message("Atualizando...".to_string());
    }

    // Views

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view. The dashboard is unavailable without stats.
    pub fn set_view(&mut self, view: View) {
        if view == View::Dashboard && self.stats.is_none() {
            return;
        }
        self.current_view = view;
    }

    // Navigation

    fn row_count(&self) -> usize {
        self.table_view().map(|v| v.row_count()).unwrap_or(0)
    }

    /// Catch up with whatever the pollers committed since the last frame.
    pub fn sync_views(&mut self) {
        self.remember_columns();
        self.clamp_selection();
    }

    fn remember_columns(&mut self) {
        if let Some(view) = self.table_view() {
            if !view.columns().is_empty() {
                self.known_columns = view.columns().to_vec();
            }
        }
    }

    /// Keep the selection inside the current table after a re-render.
    pub fn clamp_selection(&mut self) {
        let max = self.row_count().saturating_sub(1);
        self.selected_row = self.selected_row.min(max);
    }

    /// Move selection down by one row.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one row.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        self.selected_row = (self.selected_row + n).min(max);
    }

    /// Move selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_row = self.selected_row.saturating_sub(n);
    }

    /// Jump to the first row.
    pub fn select_first(&mut self) {
        self.selected_row = 0;
    }

    /// Jump to the last row.
    pub fn select_last(&mut self) {
        self.selected_row = self.row_count().saturating_sub(1);
    }

    // Search

    /// Enter search input mode (starts capturing keystrokes).
    pub fn start_search(&mut self) {
        self.search_active = true;
    }

    /// Exit search input mode, restoring the filter in effect.
    pub fn cancel_search(&mut self) {
        self.search_active = false;
        self.search_text = self.search_filter();
    }

    /// Apply the typed search and force a table refresh.
    pub fn apply_search(&mut self) {
        self.search_active = false;
        self.query.set_search(self.search_text.trim());
        self.selected_row = 0;
        self.request(RefreshRequest::Table { force: true });
    }

    /// Append a character to the search text.
    pub fn search_push(&mut self, c: char) {
        self.search_text.push(c);
    }

    /// Remove the last character from the search text.
    pub fn search_pop(&mut self) {
        self.search_text.pop();
    }

    /// Choices for the column filter: all columns, then each table column.
    ///
    /// An empty result has no columns, so the last table with rows supplies
    /// them; a filter that matches nothing can still be moved.
    pub fn column_choices(&self) -> Vec<String> {
        let mut choices = vec![String::new()];
        match self.table_view().filter(|view| !view.columns().is_empty()) {
            Some(view) => choices.extend(view.columns().iter().cloned()),
            None => choices.extend(self.known_columns.iter().cloned()),
        }
        choices
    }

    /// Move the column filter to the next column and force a refresh.
    pub fn cycle_column_filter(&mut self) {
        self.remember_columns();
        let choices = self.column_choices();
        let current = self.column_filter();
        let next = choices
            .iter()
            .position(|c| *c == current)
            .map(|i| (i + 1) % choices.len())
            .unwrap_or(0);
        self.query.set_column(choices[next].clone());
        self.selected_row = 0;
        self.request(RefreshRequest::Table { force: true });
    }

    /// Drop search and column filters and force a refresh.
    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.search_text.clear();
        self.search_active = false;
        self.selected_row = 0;
        self.request(RefreshRequest::Table { force: true });
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the views on screen to a JSON file.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        let Some(table) = self.table_view() else {
            anyhow::bail!("No data to export");
        };
        let dashboard = self.dashboard_view();
        crate::export::write_export(
            path,
            &table,
            dashboard.as_deref(),
            self.table_status(),
            &self.query.get(),
        )
    }
}

/// Human-readable label for a column filter value.
pub fn column_label(column: &str) -> &str {
    if column.is_empty() {
        "Todas as colunas"
    } else {
        column
    }
}

/// Whether the table currently shows the empty-state indicator.
pub fn is_empty_table(view: &TableView) -> bool {
    matches!(view.body, TableBody::Empty)
}
