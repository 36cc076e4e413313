use std::sync::Arc;

use satchel_shared::parking_lot::Mutex;

/// Progress of the loading as it is reported to the main control flow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Nothing was loaded yet.
    #[default]
    Idle,
    /// At least one queue is being drained.
    Loading,
    /// All queues that were dispatched are drained. A new dispatch re-enters [`LoadState::Loading`].
    Finished,
}

#[derive(Debug, Default)]
struct Inner {
    state: LoadState,
    active_runs: usize,
    started_runs: usize,
}

/// [`LoadState`] shared between the workers and the readers.
///
/// Runs may overlap. The state only becomes [`LoadState::Finished`] when the last active run ends.
#[derive(Debug, Default)]
pub struct LoadStatus {
    inner: Mutex<Inner>,
}

impl LoadStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state without blocking on any running load.
    pub fn state(&self) -> LoadState {
        self.inner.lock().state
    }

    /// Number of runs that have started but not finished yet.
    pub fn active_runs(&self) -> usize {
        self.inner.lock().active_runs
    }

    /// Publishes [`LoadState::Loading`] and returns a guard that ends the run when it is dropped.
    pub(crate) fn begin(self: &Arc<Self>) -> RunGuard {
        let mut inner = self.inner.lock();
        inner.active_runs += 1;
        inner.started_runs += 1;
        inner.state = LoadState::Loading;
        RunGuard {
            status: self.clone(),
            batch: inner.started_runs,
        }
    }

    fn finish(&self) {
        let mut inner = self.inner.lock();
        assert!(inner.active_runs > 0, "finish called without an active run");
        inner.active_runs -= 1;
        if inner.active_runs == 0 {
            inner.state = LoadState::Finished;
        }
    }
}

/// Keeps a run active. Also ends the run when a decoder panics on a worker thread.
pub(crate) struct RunGuard {
    status: Arc<LoadStatus>,
    batch: usize,
}

impl RunGuard {
    /// 1-based number of the run in the order the runs were started.
    pub fn batch(&self) -> usize {
        self.batch
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.status.finish();
    }
}
