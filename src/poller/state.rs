//! Render state owned by a poller and the read-only handle the UI uses.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::source::ComparisonKey;

/// Status indicator of a poller.
///
/// `Idle -> Fetching -> {Updated | Unchanged | Error}`, re-entered every
/// cycle. Between cycles the indicator keeps the result of the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No cycle has run yet.
    #[default]
    Idle,
    Fetching,
    /// The last cycle replaced the view.
    Updated,
    /// The last cycle fetched the already rendered snapshot.
    Unchanged,
    /// The last cycle failed; the previous view is still shown.
    Error,
}

impl Status {
    /// Text shown in the status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Idle => "aguardando",
            Status::Fetching => "buscando...",
            Status::Updated => "atualizado",
            Status::Unchanged => "sem alterações",
            Status::Error => "erro ao buscar dados",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error)
    }
}

/// Everything a poller knows about what is on screen.
#[derive(Debug)]
pub(crate) struct RenderState<V> {
    /// Key of the last rendered snapshot.
    pub key: Option<ComparisonKey>,
    /// The active view, replaced wholesale on each render.
    pub view: Option<Arc<V>>,
    /// Bumped on every render.
    pub generation: u64,
    pub status: Status,
    pub last_error: Option<String>,
    pub rendered_at: Option<Instant>,
    pub checked_at: Option<Instant>,
}

impl<V> Default for RenderState<V> {
    fn default() -> Self {
        Self {
            key: None,
            view: None,
            generation: 0,
            status: Status::Idle,
            last_error: None,
            rendered_at: None,
            checked_at: None,
        }
    }
}

/// Read-only, cloneable view of a poller's render state.
///
/// The UI holds one of these per poller and reads it every frame.
#[derive(Debug)]
pub struct PollerHandle<V> {
    state: Arc<Mutex<RenderState<V>>>,
}

impl<V> Clone for PollerHandle<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<V> PollerHandle<V> {
    pub(crate) fn new(state: Arc<Mutex<RenderState<V>>>) -> Self {
        Self { state }
    }

    /// The currently rendered view, if any cycle has rendered yet.
    pub fn view(&self) -> Option<Arc<V>> {
        self.state.lock().view.clone()
    }

    pub fn status(&self) -> Status {
        self.state.lock().status
    }

    /// Number of renders so far.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Comparison key of the rendered snapshot.
    pub fn comparison_key(&self) -> Option<ComparisonKey> {
        self.state.lock().key.clone()
    }

    /// Message of the last failed cycle, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// When the current view was rendered.
    pub fn rendered_at(&self) -> Option<Instant> {
        self.state.lock().rendered_at
    }

    /// When the last cycle finished, whatever its outcome.
    pub fn checked_at(&self) -> Option<Instant> {
        self.state.lock().checked_at
    }
}
