//! Polling with change detection and wholesale re-rendering.
//!
//! A [`Poller`] repeatedly fetches a snapshot from its [`Source`], compares
//! it with the snapshot it rendered last, and rebuilds its view only when
//! the content changed or a refresh was forced.
//!
//! ```text
//!   tick / refresh_now
//!          │
//!          ▼
//!   ┌─────────────┐  busy   ┌──────────────┐
//!   │ cycle guard │────────▶│ skip / queue │
//!   └──────┬──────┘         └──────────────┘
//!          ▼
//!   Source::fetch() ──err──▶ Status::Error (view and key untouched)
//!          │
//!          ▼
//!   comparison key == stored && !force ──▶ Status::Unchanged
//!          │
//!          ▼
//!   Render::render() ──▶ replace view, store key ──▶ Status::Updated
//! ```
//!
//! Cycles of one poller never overlap: a single-slot guard serializes them.
//! Independent pollers (table, stats) each own their state.

mod state;
mod task;

pub use state::{PollerHandle, Status};
pub use task::PollTask;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::source::{FetchError, Snapshot, Source};
use crate::view::Render;
use state::RenderState;

/// How a poller decides whether a fetched snapshot is new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeDetection {
    /// Compare [`Snapshot::comparison_key`] with the last rendered key.
    #[default]
    ComparisonKey,
    /// Re-render after every successful fetch.
    Always,
}

/// What a timer tick does when the previous cycle is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Drop the tick and rely on the next one.
    #[default]
    Skip,
    /// Wait for the in-flight cycle, then run.
    Queue,
}

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollConfig {
    interval: Duration,
    pub change_detection: ChangeDetection,
    pub overlap: OverlapPolicy,
}

impl PollConfig {
    /// Create a config with the given interval. The interval must be non-zero.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            bail!("Polling interval must be greater than zero");
        }
        Ok(Self {
            interval,
            change_detection: ChangeDetection::default(),
            overlap: OverlapPolicy::default(),
        })
    }

    pub fn with_change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Result of one fetch-compare-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The view was rebuilt.
    Updated,
    /// Same snapshot as the one on screen; nothing was rebuilt.
    Unchanged,
    /// Fetch or parse failed; the previous view stays.
    Failed,
    /// Another cycle was in flight and the tick was dropped.
    Skipped,
}

/// Fetches snapshots from a source and keeps a rendered view up to date.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use sheetwatch::{ApiClient, PollConfig, Poller, TableSource, TableView};
///
/// # tokio_test::block_on(async {
/// let client = ApiClient::builder().endpoint("http://127.0.0.1:8000").build().unwrap();
/// let config = PollConfig::new(Duration::from_secs(8)).unwrap();
/// let poller: Arc<Poller<TableSource, TableView>> =
///     Arc::new(Poller::new(TableSource::new(client, "/api/data"), config));
///
/// let handle = poller.handle();
/// let task = Arc::clone(&poller).start();
///
/// // Later, from a user action:
/// poller.refresh_now(true).await;
/// println!("status: {}", handle.status().label());
///
/// task.stop();
/// # });
/// ```
#[derive(Debug)]
pub struct Poller<S, V> {
    source: S,
    config: PollConfig,
    state: Arc<Mutex<RenderState<V>>>,
    in_flight: tokio::sync::Mutex<()>,
}

impl<S, V> Poller<S, V>
where
    S: Source,
    V: Render<Snapshot = S::Snapshot>,
{
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source,
            config,
            state: Arc::new(Mutex::new(RenderState::default())),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// A read-only handle on this poller's render state.
    pub fn handle(&self) -> PollerHandle<V> {
        PollerHandle::new(Arc::clone(&self.state))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Run one cycle out of band, e.g. from a user action.
    ///
    /// Waits for an in-flight cycle instead of dropping the request.
    /// `force` bypasses change detection and always re-renders.
    pub async fn refresh_now(&self, force: bool) -> CycleOutcome {
        let _guard = self.in_flight.lock().await;
        self.run_cycle(force).await
    }

    /// Run one timer-driven cycle, honoring the overlap policy.
    pub async fn tick(&self) -> CycleOutcome {
        match self.config.overlap {
            OverlapPolicy::Queue => {
                let _guard = self.in_flight.lock().await;
                self.run_cycle(false).await
            }
            OverlapPolicy::Skip => match self.in_flight.try_lock() {
                Ok(_guard) => self.run_cycle(false).await,
                Err(_) => {
                    debug!(source = self.source.description(), "Cycle in flight, skipping tick");
                    CycleOutcome::Skipped
                }
            },
        }
    }

    /// Fetch, compare, render. Callers hold the in-flight guard.
    async fn run_cycle(&self, force: bool) -> CycleOutcome {
        self.state.lock().status = Status::Fetching;

        let snapshot = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e),
        };

        let key = match self.config.change_detection {
            ChangeDetection::Always => None,
            ChangeDetection::ComparisonKey => match snapshot.comparison_key() {
                Ok(key) => Some(key),
                Err(e) => return self.fail(e.into()),
            },
        };

        {
            let mut state = self.state.lock();
            if !force && key.is_some() && key == state.key {
                state.status = Status::Unchanged;
                state.last_error = None;
                state.checked_at = Some(Instant::now());
                debug!(source = self.source.description(), "Snapshot unchanged");
                return CycleOutcome::Unchanged;
            }
        }

        let view = Arc::new(V::render(&snapshot));

        let mut state = self.state.lock();
        let now = Instant::now();
        state.key = key;
        state.view = Some(view);
        state.generation += 1;
        state.status = Status::Updated;
        state.last_error = None;
        state.rendered_at = Some(now);
        state.checked_at = Some(now);
        info!(
            source = self.source.description(),
            generation = state.generation,
            force,
            "Rendered new snapshot"
        );
        CycleOutcome::Updated
    }

    fn fail(&self, err: FetchError) -> CycleOutcome {
        warn!(source = self.source.description(), error = %err, "Fetch cycle failed");
        let mut state = self.state.lock();
        state.status = Status::Error;
        state.last_error = Some(err.to_string());
        state.checked_at = Some(Instant::now());
        CycleOutcome::Failed
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{one_row, snapshot, stats, ScriptedSource};
    use super::*;
    use crate::source::StatsSnapshot;
    use crate::view::format::format_timestamp;
    use crate::view::{DashboardView, TableBody, TableView};
    use serde_json::json;

    fn poller(source: ScriptedSource) -> Arc<Poller<ScriptedSource, TableView>> {
        let config = PollConfig::new(Duration::from_secs(8)).unwrap();
        Arc::new(Poller::new(source, config))
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(PollConfig::new(Duration::ZERO).is_err());
        let config = PollConfig::new(Duration::from_millis(1)).unwrap();
        assert_eq!(config.change_detection, ChangeDetection::ComparisonKey);
        assert_eq!(config.overlap, OverlapPolicy::Skip);
    }

    #[tokio::test]
    async fn test_initial_load_renders_table() {
        let source = ScriptedSource::new();
        source.push(one_row());
        let poller = poller(source);
        let handle = poller.handle();

        assert_eq!(handle.status(), Status::Idle);
        assert_eq!(poller.tick().await, CycleOutcome::Updated);

        let view = handle.view().unwrap();
        assert_eq!(view.row_count(), 1);
        assert_eq!(view.last_updated, format_timestamp(Some(1700000000.0)));
        assert_eq!(handle.status().label(), "atualizado");
        assert_eq!(handle.generation(), 1);
        assert!(handle.rendered_at().is_some());
    }

    #[tokio::test]
    async fn test_identical_snapshot_is_unchanged() {
        let source = ScriptedSource::new();
        source.push(one_row()).push(one_row());
        let poller = poller(source);
        let handle = poller.handle();

        poller.tick().await;
        let first_view = handle.view().unwrap();
        let first_key = handle.comparison_key();

        assert_eq!(poller.tick().await, CycleOutcome::Unchanged);
        assert_eq!(handle.status().label(), "sem alterações");
        assert_eq!(handle.generation(), 1);
        assert!(Arc::ptr_eq(&first_view, &handle.view().unwrap()));
        assert_eq!(handle.comparison_key(), first_key);
    }

    #[tokio::test]
    async fn test_new_timestamp_same_rows_is_unchanged() {
        let source = ScriptedSource::new();
        source.push(one_row()).push(snapshot(json!({
            "rows": [{"id": 1, "name": "A"}],
            "last_updated": 1800000000
        })));
        let poller = poller(source);

        poller.tick().await;
        assert_eq!(poller.tick().await, CycleOutcome::Unchanged);
        assert_eq!(
            poller.handle().view().unwrap().last_updated,
            format_timestamp(Some(1700000000.0))
        );
    }

    #[tokio::test]
    async fn test_changed_snapshot_replaces_view() {
        let second = snapshot(json!({
            "rows": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "last_updated": 1700000100
        }));
        let source = ScriptedSource::new();
        source.push(one_row()).push(second.clone());
        let poller = poller(source);
        let handle = poller.handle();

        poller.tick().await;
        let first_view = handle.view().unwrap();

        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        let view = handle.view().unwrap();
        assert!(!Arc::ptr_eq(&first_view, &view));
        assert_eq!(view.row_count(), 2);
        assert_eq!(handle.generation(), 2);
        assert_eq!(handle.comparison_key(), Some(second.comparison_key().unwrap()));
    }

    #[tokio::test]
    async fn test_forced_refresh_always_renders() {
        let source = ScriptedSource::new();
        source.push(one_row()).push(one_row());
        let poller = poller(source);
        let handle = poller.handle();

        poller.tick().await;
        let first_view = handle.view().unwrap();

        assert_eq!(poller.refresh_now(true).await, CycleOutcome::Updated);
        assert_eq!(handle.generation(), 2);
        assert!(!Arc::ptr_eq(&first_view, &handle.view().unwrap()));
        assert_eq!(handle.status(), Status::Updated);
    }

    #[tokio::test]
    async fn test_unforced_refresh_uses_change_detection() {
        let source = ScriptedSource::new();
        source.push(one_row());
        let poller = poller(source);

        poller.refresh_now(false).await;
        assert_eq!(poller.refresh_now(false).await, CycleOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_empty_rows_render_empty_state() {
        let source = ScriptedSource::new();
        source.push(snapshot(json!({"rows": []})));
        let poller = poller(source);

        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        assert_eq!(poller.handle().view().unwrap().body, TableBody::Empty);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_render() {
        let source = ScriptedSource::new();
        source.push(one_row()).push_error("connection reset");
        let poller = poller(source);
        let handle = poller.handle();

        poller.tick().await;
        let view = handle.view().unwrap();
        let key = handle.comparison_key();

        assert_eq!(poller.tick().await, CycleOutcome::Failed);
        assert_eq!(handle.status().label(), "erro ao buscar dados");
        assert!(handle.last_error().unwrap().contains("connection reset"));
        assert!(Arc::ptr_eq(&view, &handle.view().unwrap()));
        assert_eq!(handle.comparison_key(), key);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.view().unwrap().row_count(), 1);
    }

    #[tokio::test]
    async fn test_recovery_after_failure_with_same_rows_is_unchanged() {
        let source = ScriptedSource::new();
        source.push(one_row()).push_error("timeout").push(one_row());
        let poller = poller(source);
        let handle = poller.handle();

        poller.tick().await;
        poller.tick().await;
        assert_eq!(poller.tick().await, CycleOutcome::Unchanged);
        assert!(handle.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failure_before_first_render() {
        let source = ScriptedSource::new();
        source.push_error("refused");
        let poller = poller(source);
        let handle = poller.handle();

        assert_eq!(poller.tick().await, CycleOutcome::Failed);
        assert!(handle.view().is_none());
        assert!(handle.comparison_key().is_none());
        assert_eq!(handle.status(), Status::Error);
    }

    #[tokio::test]
    async fn test_always_mode_renders_every_cycle() {
        let source = ScriptedSource::new();
        source.push(one_row());
        let config = PollConfig::new(Duration::from_secs(1))
            .unwrap()
            .with_change_detection(ChangeDetection::Always);
        let poller: Poller<_, TableView> = Poller::new(source, config);

        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        assert_eq!(poller.handle().generation(), 2);
        assert!(poller.handle().comparison_key().is_none());
    }

    #[tokio::test]
    async fn test_tick_skips_while_cycle_in_flight() {
        let (source, gate) = ScriptedSource::gated();
        source.push(one_row());
        let poller = poller(source);
        let handle = poller.handle();

        let first = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.tick().await }
        });
        while poller.source().fetches() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.status(), Status::Fetching);

        assert_eq!(poller.tick().await, CycleOutcome::Skipped);
        assert_eq!(poller.source().fetches(), 1);

        gate.add_permits(1);
        assert_eq!(first.await.unwrap(), CycleOutcome::Updated);
    }

    #[tokio::test]
    async fn test_queued_tick_waits_for_in_flight_cycle() {
        let (source, gate) = ScriptedSource::gated();
        source.push(one_row());
        let config = PollConfig::new(Duration::from_secs(8))
            .unwrap()
            .with_overlap(OverlapPolicy::Queue);
        let poller = Arc::new(Poller::<_, TableView>::new(source, config));

        let first = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.tick().await }
        });
        while poller.source().fetches() == 0 {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.tick().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(poller.source().fetches(), 1);

        gate.add_permits(2);
        assert_eq!(first.await.unwrap(), CycleOutcome::Updated);
        assert_eq!(second.await.unwrap(), CycleOutcome::Unchanged);
        assert_eq!(poller.source().fetches(), 2);
    }

    #[tokio::test]
    async fn test_manual_refresh_queues_behind_tick() {
        let (source, gate) = ScriptedSource::gated();
        source.push(one_row());
        let poller = poller(source);

        let tick = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.tick().await }
        });
        while poller.source().fetches() == 0 {
            tokio::task::yield_now().await;
        }

        let refresh = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.refresh_now(true).await }
        });

        gate.add_permits(2);
        assert_eq!(tick.await.unwrap(), CycleOutcome::Updated);
        assert_eq!(refresh.await.unwrap(), CycleOutcome::Updated);
        assert_eq!(poller.handle().generation(), 2);
    }

    #[tokio::test]
    async fn test_independent_pollers_do_not_share_state() {
        let a = ScriptedSource::new();
        a.push(one_row());
        let b = ScriptedSource::new();
        b.push(snapshot(json!({"rows": []})));

        let first = poller(a);
        let second = poller(b);

        first.tick().await;
        assert_eq!(first.handle().generation(), 1);
        assert_eq!(second.handle().generation(), 0);

        second.tick().await;
        assert_eq!(first.handle().view().unwrap().row_count(), 1);
        assert_eq!(second.handle().view().unwrap().body, TableBody::Empty);
    }

    fn stats_poller(
        source: ScriptedSource<StatsSnapshot>,
    ) -> Arc<Poller<ScriptedSource<StatsSnapshot>, DashboardView>> {
        let config = PollConfig::new(Duration::from_secs(15)).unwrap();
        Arc::new(Poller::new(source, config))
    }

    fn stats_body(total: u64) -> serde_json::Value {
        json!({
            "total_rows": total,
            "missing_per_column": {"email": 1},
            "timeseries_monthly": [{"period": "2024-01", "count": total}]
        })
    }

    #[tokio::test]
    async fn test_stats_poller_detects_unchanged_and_changed() {
        let source = ScriptedSource::new();
        source
            .push(stats(stats_body(10)))
            .push(stats(stats_body(10)))
            .push(stats(stats_body(11)));
        let poller = stats_poller(source);
        let handle = poller.handle();

        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        let first = handle.view().unwrap();
        assert_eq!(first.cards[0].value, "10");

        assert_eq!(poller.tick().await, CycleOutcome::Unchanged);
        assert!(Arc::ptr_eq(&first, &handle.view().unwrap()));
        assert_eq!(handle.generation(), 1);

        assert_eq!(poller.tick().await, CycleOutcome::Updated);
        let second = handle.view().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.timeseries, vec![("2024-01".to_string(), 11)]);
        assert_eq!(handle.generation(), 2);
    }

    #[tokio::test]
    async fn test_stats_envelope_without_stats_keeps_dashboard() {
        let source = ScriptedSource::new();
        source.push(stats(stats_body(10))).push_result(
            StatsSnapshot::from_envelope(json!({"error": "planilha indisponível"}))
                .map_err(FetchError::from),
        );
        let poller = stats_poller(source);
        let handle = poller.handle();

        poller.tick().await;
        let view = handle.view().unwrap();
        let key = handle.comparison_key();

        assert_eq!(poller.tick().await, CycleOutcome::Failed);
        assert_eq!(handle.status(), Status::Error);
        assert!(handle.last_error().unwrap().contains("stats"));
        assert!(Arc::ptr_eq(&view, &handle.view().unwrap()));
        assert_eq!(handle.comparison_key(), key);
    }

    #[tokio::test]
    async fn test_table_and_stats_pollers_run_side_by_side() {
        let rows = ScriptedSource::new();
        rows.push(one_row()).push_error("connection reset");
        let totals = ScriptedSource::new();
        totals.push(stats(stats_body(1)));

        let table = poller(rows);
        let dashboard = stats_poller(totals);

        table.tick().await;
        dashboard.tick().await;
        assert_eq!(table.tick().await, CycleOutcome::Failed);
        assert_eq!(dashboard.tick().await, CycleOutcome::Unchanged);

        assert_eq!(table.handle().status(), Status::Error);
        assert_eq!(dashboard.handle().status(), Status::Unchanged);
        assert!(dashboard.handle().last_error().is_none());
    }
}
