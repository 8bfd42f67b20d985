//! # sheetwatch
//!
//! A terminal dashboard and library that polls a sheet viewer API and keeps
//! a rendered table and statistics panel in sync with it.
//!
//! Each data set is driven by a [`Poller`]: on a fixed interval it fetches a
//! snapshot, compares it with the one it rendered last, and rebuilds the
//! view wholesale only when something changed. Failed fetches leave the last
//! render on screen and surface as an error status.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │ source  │───▶│  poller  │───▶│  view   │───▶│   ui    │ │
//! │  │ (fetch) │    │(compare) │    │(render) │    │ (draw)  │ │
//! │  └─────────┘    └────┬─────┘    └─────────┘    └────▲────┘ │
//! │                      │ PollerHandle                 │      │
//! │                      └────────────▶ app ────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`Source`] trait and the HTTP sources for the rows
//!   and statistics endpoints
//! - **[`poller`]**: Fetch, compare, render cycles; the repeating task and
//!   its overlap policy
//! - **[`view`]**: Plain render models built from snapshots ([`TableView`],
//!   [`DashboardView`])
//! - **[`app`]**: TUI state, navigation, filters and refresh requests
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a local sheet viewer
//! sheetwatch --url http://127.0.0.1:8000
//!
//! # Log every cycle instead of drawing a TUI
//! sheetwatch --headless --interval 2
//!
//! # One forced refresh, written to a file
//! sheetwatch --export snapshot.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sheetwatch::{ApiClient, PollConfig, Poller, StatsSource, DashboardView};
//!
//! # tokio_test::block_on(async {
//! let client = ApiClient::builder()
//!     .endpoint("http://127.0.0.1:8000")
//!     .timeout(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//! let config = PollConfig::new(Duration::from_secs(15)).unwrap();
//! let stats: Arc<Poller<StatsSource, DashboardView>> =
//!     Arc::new(Poller::new(StatsSource::new(client, "/api/stats"), config));
//!
//! let task = Arc::clone(&stats).start();
//! // ... read stats.handle().view() whenever convenient ...
//! task.stop();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod events;
pub mod export;
pub mod poller;
pub mod source;
pub mod ui;
pub mod view;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use poller::{
    ChangeDetection, CycleOutcome, OverlapPolicy, PollConfig, PollTask, Poller, PollerHandle,
    Status,
};
pub use source::{
    ApiClient, DataQuery, DataSnapshot, FetchError, QueryHandle, Snapshot, Source, StatsSnapshot,
    StatsSource, TableSource,
};
pub use view::{DashboardView, Render, TableView};
