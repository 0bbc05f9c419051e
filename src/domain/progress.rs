//! Per-bill progress events and the cooperative stop signal.
//!
//! Progress delivery is best-effort: events go through a bounded channel with
//! `try_send`, so a slow or absent listener never blocks a bill-task.

use std::fmt;

use tokio::sync::{mpsc, watch};

/// States of one bill-task. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Queued,
    Fetching,
    Filtering,
    Probing,
    Selecting,
    Persisting,
    Done,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Fetching => "fetching",
            TaskState::Filtering => "filtering",
            TaskState::Probing => "probing",
            TaskState::Selecting => "selecting",
            TaskState::Persisting => "persisting",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition of one bill-task, for UI feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub bill_id: Option<i64>,
    pub year: i32,
    pub title: String,
    pub state: TaskState,
    pub detail: Option<String>,
}

impl ProgressEvent {
    pub fn new(bill_id: Option<i64>, year: i32, title: &str, state: TaskState) -> Self {
        Self {
            bill_id,
            year,
            title: title.to_string(),
            state,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Sending half of the progress channel. A disabled sink drops everything.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Creates a sink and its receiver with the given queue capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx
            && let Err(e) = tx.try_send(event)
        {
            tracing::trace!(error = %e, "progress event dropped");
        }
    }
}

/// Cooperative stop signal shared by the coordinator and every bill-task.
///
/// Tasks check it at state-transition boundaries only; an external call that
/// is already in flight always runs to completion.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: std::sync::Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
            rx,
        }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Probing.is_terminal());
        assert_eq!(TaskState::Persisting.to_string(), "persisting");
    }

    #[tokio::test]
    async fn test_sink_delivers_events() {
        let (sink, mut rx) = ProgressSink::channel(4);
        sink.emit(ProgressEvent::new(Some(1), 2025, "Aviation Safety Act", TaskState::Fetching));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.state, TaskState::Fetching);
        assert_eq!(event.bill_id, Some(1));
    }

    #[tokio::test]
    async fn test_full_sink_drops_instead_of_blocking() {
        let (sink, mut rx) = ProgressSink::channel(1);
        sink.emit(ProgressEvent::new(None, 2025, "a", TaskState::Queued));
        sink.emit(ProgressEvent::new(None, 2025, "b", TaskState::Queued));

        assert_eq!(rx.recv().await.unwrap().title, "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_sink_is_noop() {
        ProgressSink::disabled().emit(ProgressEvent::new(None, 2025, "x", TaskState::Done));
    }

    #[test]
    fn test_stop_signal_is_shared_between_clones() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_stopped());
        signal.stop();
        assert!(clone.is_stopped());
    }
}
