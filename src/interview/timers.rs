//! Cancellable timer registry for deferred interview work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tracing::debug;

/// What a pending timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The 3-2-1 pre-recording countdown.
    Countdown,
    /// Periodic metric sampling while listening.
    Sampling,
    /// Video attention check and its warning clearance.
    Attention,
    /// Deferred question presentation and speech.
    Speech,
}

/// Tracks spawned timer tasks by kind so they can be aborted together.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    handles: Mutex<HashMap<TimerKind, Vec<JoinHandle<()>>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` and register it under `kind`.
    pub fn spawn<F>(&self, kind: TimerKind, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.lock();
        let entry = handles.entry(kind).or_default();
        entry.retain(|h| !h.is_finished());
        entry.push(handle);
    }

    /// Abort every pending timer of `kind`. Returns how many were still running.
    pub fn cancel(&self, kind: TimerKind) -> usize {
        let drained = self.lock().remove(&kind).unwrap_or_default();
        let aborted = abort_all(drained);
        if aborted > 0 {
            debug!(?kind, aborted, "Cancelled timers");
        }
        aborted
    }

    /// Abort every pending timer.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<JoinHandle<()>> = self.lock().drain().flat_map(|(_, v)| v).collect();
        let aborted = abort_all(drained);
        if aborted > 0 {
            debug!(aborted, "Cancelled all timers");
        }
        aborted
    }

    /// Number of timers of `kind` that have not completed.
    pub fn pending(&self, kind: TimerKind) -> usize {
        self.lock()
            .get(&kind)
            .map(|v| v.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Number of timers of any kind that have not completed.
    pub fn pending_total(&self) -> usize {
        self.lock()
            .values()
            .flat_map(|v| v.iter())
            .filter(|h| !h.is_finished())
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TimerKind, Vec<JoinHandle<()>>>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn abort_all(handles: Vec<JoinHandle<()>>) -> usize {
    let mut aborted = 0;
    for handle in handles {
        if !handle.is_finished() {
            aborted += 1;
        }
        handle.abort();
    }
    aborted
}
