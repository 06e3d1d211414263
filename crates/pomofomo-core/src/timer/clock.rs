//! Tick sources.
//!
//! A timer that is running holds exactly one [`TickHandle`]. Dropping or
//! cancelling the handle stops the ticks, so a timer cannot outlive its
//! clock subscription and a released timer cannot keep receiving ticks.
//!
//! Ticks are delivered to the owner of the clock, not to the timer itself.
//! Each [`Tick`] carries the id of the handle that produced it so the
//! receiver can drop ticks that were already queued when the handle was
//! released.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

use super::Mode;

/// Period between two ticks of an armed timer.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One periodic trigger for the timer identified by `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub mode: Mode,
    pub handle: u64,
}

/// Something that can arm a periodic tick for a timer.
pub trait Clock: Send + Sync {
    /// Start ticking for `mode`. The first tick arrives one period later.
    fn arm(&self, mode: Mode) -> TickHandle;
}

/// Live subscription to a clock. Ticks stop when this is cancelled or dropped.
pub struct TickHandle {
    id: u64,
    mode: Mode,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    pub fn new(id: u64, mode: Mode, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            mode,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stop the ticks. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!(handle = self.id, mode = %self.mode, "tick source released");
            release();
        }
    }
}

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish()
    }
}

// ── Interval clock ────────────────────────────────────────────────────

/// Real-time clock backed by a tokio interval task per armed timer.
///
/// Ticks are sent on the channel returned by [`IntervalClock::new`].
/// Arming must happen inside a tokio runtime.
pub struct IntervalClock {
    tx: mpsc::UnboundedSender<Tick>,
    period: Duration,
    next_id: AtomicU64,
}

impl IntervalClock {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        Self::with_period(TICK_PERIOD)
    }

    /// Clock with a custom period.
    pub fn with_period(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Self {
            tx,
            period,
            next_id: AtomicU64::new(1),
        };
        (clock, rx)
    }
}

impl Clock for IntervalClock {
    fn arm(&self, mode: Mode) -> TickHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tx = self.tx.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if tx.send(Tick { mode, handle: id }).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(handle = id, %mode, "tick source armed");
        TickHandle::new(id, mode, move || task.abort())
    }
}

// ── Manual clock ──────────────────────────────────────────────────────

#[derive(Default)]
struct ManualInner {
    next_id: AtomicU64,
    armed: AtomicUsize,
    live: Mutex<Vec<(u64, Mode)>>,
}

/// Clock that never ticks on its own.
///
/// Keeps track of live handles so tests can check that no tick source is
/// leaked, and hands out [`Tick`]s for whichever handle is live.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<ManualInner>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently live.
    pub fn live(&self) -> usize {
        self.lock_live().len()
    }

    /// Number of live handles for one timer.
    pub fn live_for(&self, mode: Mode) -> usize {
        self.lock_live().iter().filter(|(_, m)| *m == mode).count()
    }

    /// Number of handles ever armed.
    pub fn armed(&self) -> usize {
        self.inner.armed.load(Ordering::SeqCst)
    }

    /// A tick for the live handle of `mode`, if the timer is armed.
    pub fn tick_for(&self, mode: Mode) -> Option<Tick> {
        self.lock_live()
            .iter()
            .find(|(_, m)| *m == mode)
            .map(|&(handle, mode)| Tick { mode, handle })
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Mode)>> {
        self.inner
            .live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn arm(&self, mode: Mode) -> TickHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.armed.fetch_add(1, Ordering::SeqCst);
        self.lock_live().push((id, mode));

        let inner = Arc::clone(&self.inner);
        TickHandle::new(id, mode, move || {
            let mut live = inner
                .live
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            live.retain(|(handle, _)| *handle != id);
        })
    }
}
