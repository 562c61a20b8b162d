//! Background task slots owned by the engine.
//!
//! The engine runs at most one retry chain and one reconnection loop. Each
//! lives in a slot here so it can be aborted on shutdown or when the last
//! engine handle goes away.

use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;

/// Which background task a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    Retry,
    Reconnect,
}

#[derive(Default)]
pub(crate) struct Timers {
    retry: Mutex<Option<JoinHandle<()>>>,
    reconnect: Mutex<Option<JoinHandle<()>>>,
}

impl Timers {
    fn slot(&self, kind: TimerKind) -> &Mutex<Option<JoinHandle<()>>> {
        match kind {
            TimerKind::Retry => &self.retry,
            TimerKind::Reconnect => &self.reconnect,
        }
    }

    /// Store a freshly spawned task. A finished task in the slot is dropped.
    pub(crate) fn install(&self, kind: TimerKind, handle: JoinHandle<()>) {
        let mut slot = self
            .slot(kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            if !previous.is_finished() {
                tracing::debug!(?kind, "replacing a background task that is winding down");
                previous.abort();
            }
        }
    }

    /// Whether the task in a slot is still running.
    #[cfg(test)]
    pub(crate) fn is_active(&self, kind: TimerKind) -> bool {
        self.slot(kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Abort every pending task.
    pub(crate) fn cancel_all(&self) {
        for kind in [TimerKind::Retry, TimerKind::Reconnect] {
            if let Some(handle) = self
                .slot(kind)
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                handle.abort();
            }
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_aborts_tasks() {
        let timers = Timers::default();
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        timers.install(TimerKind::Reconnect, handle);
        assert!(timers.is_active(TimerKind::Reconnect));
        assert!(!timers.is_active(TimerKind::Retry));

        timers.cancel_all();
        tokio::task::yield_now().await;
        assert!(!timers.is_active(TimerKind::Reconnect));
    }
}
