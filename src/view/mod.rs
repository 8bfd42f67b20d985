//! View models built from snapshots.
//!
//! A view is the rendered form of one snapshot. It is built wholesale by
//! [`Render::render`] and replaced, never patched, when a newer snapshot
//! arrives. The terminal UI only ever draws views.
//!
//! ## Submodules
//!
//! - [`format`]: Cell, number and timestamp formatting
//! - [`table`]: The data table ([`TableView`]) and its empty state
//! - [`dashboard`]: Summary cards, categorical top values, monthly series
//!
//! ## Data Flow
//!
//! ```text
//! DataSnapshot ──▶ TableView::render()     ──▶ ui::table
//! StatsSnapshot ─▶ DashboardView::render() ──▶ ui::dashboard
//! ```

pub mod dashboard;
pub mod format;
pub mod table;

pub use dashboard::{Card, CategoricalView, DashboardView};
pub use table::{TableBody, TableView};

use crate::source::Snapshot;

/// Build a view from a snapshot.
pub trait Render: Send + Sync + Sized + 'static {
    /// The snapshot type this view is rendered from.
    type Snapshot: Snapshot;

    fn render(snapshot: &Self::Snapshot) -> Self;
}
