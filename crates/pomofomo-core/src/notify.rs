//! Fire-and-forget side effects: the completion alarm and user-facing notices.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::events::Event;

/// Receives alarms and state-change events. Must not block.
pub trait Notifier: Send + Sync {
    /// Audible/visual alarm for a finished countdown.
    fn alarm(&self);

    fn notify(&self, event: &Event);
}

/// Writes every notice to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alarm(&self) {
        tracing::info!(target: "pomofomo::alarm", "alarm");
    }

    fn notify(&self, event: &Event) {
        if let Some(message) = event.message() {
            tracing::info!(target: "pomofomo::notice", "{message}");
        }
    }
}

/// Keeps everything it is told. For assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alarms: AtomicUsize,
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn alarms(&self) -> usize {
        self.alarms.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn alarm(&self) {
        self.alarms.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
