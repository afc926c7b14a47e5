//! Per-file content cache with idle decay.
//!
//! A `DecayCache` holds the fetched bytes of one file. Readers pin it while
//! they copy from the buffer; when the last reader unpins, an eviction timer
//! is armed and the buffer is released once it fires. A pin that arrives
//! first cancels the timer.
//!
//! All state sits behind one lock owned by the cache itself, so pin, unpin,
//! flush and a firing timer never race, whatever lock the caller holds. The
//! timer task only keeps a weak reference to that state and carries the
//! generation it was armed with; a timer that was cancelled or superseded
//! finds a different generation and does nothing.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct CacheState {
    data: Option<Bytes>,
    readers: usize,
    timer: Option<Timer>,
    generation: u64,
}

impl CacheState {
    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    fn evict(&mut self) {
        self.cancel_timer();
        self.data = None;
    }
}

pub struct DecayCache {
    state: Arc<Mutex<CacheState>>,
    idle: Duration,
}

impl DecayCache {
    /// Empty cache whose buffer decays after `idle` without readers.
    pub fn new(idle: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            idle,
        }
    }

    /// Registers a reader, cancelling any pending eviction.
    pub fn pin(&self) {
        let mut state = self.state.lock();
        if state.cancel_timer() {
            debug!("cancelled cache decay timer");
        }
        state.readers += 1;
        debug!(readers = state.readers, "pinned file cache");
    }

    /// Releases a reader; the last one out arms the eviction timer.
    pub fn unpin(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "unpin without pin");
        state.readers = state.readers.saturating_sub(1);
        debug!(readers = state.readers, "unpinned file cache");
        if state.readers == 0 && state.data.is_some() {
            self.arm(&mut state);
        }
    }

    /// Pins the cache until the returned guard is dropped.
    pub fn pinned(self: &Arc<Self>) -> PinGuard {
        self.pin();
        PinGuard {
            cache: Arc::clone(self),
        }
    }

    /// Drops the buffer and any pending timer. A no-op on an empty cache.
    pub fn flush(&self) {
        self.state.lock().evict();
        debug!("flushed file cache");
    }

    /// Stores freshly fetched content.
    pub fn fill(&self, data: Bytes) {
        self.state.lock().data = Some(data);
    }

    /// Current buffer, if fetched and not evicted.
    pub fn data(&self) -> Option<Bytes> {
        self.state.lock().data.clone()
    }

    pub fn readers(&self) -> usize {
        self.state.lock().readers
    }

    /// Whether an eviction timer is pending.
    pub fn has_timer(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    fn arm(&self, state: &mut CacheState) {
        state.cancel_timer();
        state.generation += 1;
        let generation = state.generation;

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                // Nothing can drive a timer; evict right away.
                state.data = None;
                debug!("no runtime for cache decay timer, flushed immediately");
                return;
            }
        };

        // The deadline counts from the unpin, not from the task's first poll.
        let deadline = tokio::time::Instant::now() + self.idle;
        let weak: Weak<Mutex<CacheState>> = Arc::downgrade(&self.state);
        let task = handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = state.lock();
            let current = state.timer.as_ref().map(|t| t.generation);
            if current == Some(generation) && state.readers == 0 {
                // Dropping our own handle here only detaches the task.
                state.timer = None;
                state.data = None;
                debug!("cache decayed");
            }
        });
        state.timer = Some(Timer {
            generation,
            handle: task,
        });
        debug!(idle_secs = self.idle.as_secs(), "armed cache decay timer");
    }
}

impl Drop for DecayCache {
    fn drop(&mut self) {
        self.state.lock().cancel_timer();
    }
}

impl std::fmt::Debug for DecayCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DecayCache")
            .field("cached", &state.data.as_ref().map(Bytes::len))
            .field("readers", &state.readers)
            .field("timer", &state.timer.is_some())
            .field("idle", &self.idle)
            .finish()
    }
}

/// Keeps a [`DecayCache`] pinned; unpins on drop.
pub struct PinGuard {
    cache: Arc<DecayCache>,
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.cache.unpin();
    }
}
