//! Snapshot sources.
//!
//! A [`Source`] fetches one snapshot per call. Pollers own their source and
//! never share it, so the fetch target is fixed for a poller's lifetime.

mod error;
mod http;
mod snapshot;

pub use error::FetchError;
pub use http::{ApiClient, ApiClientBuilder, DataQuery, QueryHandle, StatsSource, TableSource};
pub use snapshot::{
    CategoricalSummary, ComparisonKey, DataSnapshot, MonthlyCount, NumericStat, Row, Snapshot,
    Stats, StatsSnapshot,
};

use std::fmt::Debug;

use async_trait::async_trait;

/// Trait for fetching snapshots from a backend.
///
/// # Example
///
/// ```no_run
/// use sheetwatch::{ApiClient, Source, TableSource};
///
/// # tokio_test::block_on(async {
/// let client = ApiClient::builder().endpoint("http://127.0.0.1:8000").build().unwrap();
/// let source = TableSource::new(client, "/api/data");
/// let snapshot = source.fetch().await.unwrap();
/// println!("{} rows", snapshot.rows.len());
/// # });
/// ```
#[async_trait]
pub trait Source: Send + Sync + Debug {
    /// The snapshot type this source produces.
    type Snapshot: Snapshot;

    /// Fetch the current snapshot, bypassing any intermediate cache.
    async fn fetch(&self) -> Result<Self::Snapshot, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar and in logs.
    fn description(&self) -> &str;
}
