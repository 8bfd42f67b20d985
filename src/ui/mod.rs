//! Terminal UI rendering using ratatui.
//!
//! - [`table`]: the polled rows, or the empty-state message
//! - [`dashboard`]: summary cards, categorical top values, monthly chart
//! - [`common`]: header, tabs, status bar and help overlay
//! - [`theme`]: light/dark palettes with terminal auto-detection
//!
//! Frame layout, top to bottom:
//!
//! ```text
//!  ● SHEETWATCH │ atualizado │ Última atualização: ...   common::render_header
//!  1:Tabela | 2:Painel                                  common::render_tabs
//! ╭────────────────────────────────────────────────╮
//! │ table::render or dashboard::render             │
//! ╰────────────────────────────────────────────────╯
//!  http://.../api/data | atualizado há 3s | ...         common::render_status_bar
//! ```
//!
//! Drawing only reads [`App`](crate::app::App). Each frame shows whatever
//! the pollers committed last, so redrawing never triggers a fetch.

pub mod common;
pub mod dashboard;
pub mod table;
pub mod theme;

pub use theme::Theme;
