//! Microsecond time sources.
//!
//! The scheduler never owns a clock; it reads one through [`Clock`]. All
//! timestamps are 64-bit microseconds so a long-running device never sees a
//! rollover in practice, and differences are taken with wrapping arithmetic
//! so a platform counter that does wrap still yields correct intervals.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::sync::{Arc, Mutex};

/// Monotonic microsecond counter.
///
/// Implementations must never go backward within one power cycle.
pub trait Clock: Send + Sync {
    fn now_usec(&self) -> u64;
}

/// Shared clock reference handed to every frame counter.
pub type ClockRef = Arc<dyn Clock>;

/// Wrap-safe difference `now - since`.
#[inline]
pub fn elapsed_since(now: u64, since: u64) -> u64 {
    now.wrapping_sub(since)
}

impl<F> Clock for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn now_usec(&self) -> u64 {
        self()
    }
}

/// Clock advanced by hand.
///
/// Used by tests and by simulations that replay a recorded timeline.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_usec: u64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicU64::new(start_usec),
        })
    }

    pub fn set_usec(&self, usec: u64) {
        self.now.store(usec, Ordering::SeqCst);
    }

    pub fn advance_usec(&self, usec: u64) {
        self.now.fetch_add(usec, Ordering::SeqCst);
    }

    pub fn advance_msec(&self, msec: u64) {
        self.advance_usec(msec * 1_000);
    }
}

impl Clock for ManualClock {
    fn now_usec(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

struct WideState {
    last: u32,
    high: u64,
}

/// Widens a 32-bit wrapping microsecond counter to 64 bits.
///
/// Typical embedded `micros()` counters wrap roughly every 71.6 minutes. The
/// wrapper counts wraps on each read, so it must be read at least once per
/// wrap period; the scene registry's poll loop does that naturally.
pub struct WrappingMicros<F> {
    raw: F,
    state: Mutex<WideState>,
}

impl<F> WrappingMicros<F>
where
    F: Fn() -> u32 + Send + Sync,
{
    pub fn new(raw: F) -> Self {
        let last = raw();
        Self {
            raw,
            state: Mutex::new(WideState { last, high: 0 }),
        }
    }
}

impl<F> Clock for WrappingMicros<F>
where
    F: Fn() -> u32 + Send + Sync,
{
    fn now_usec(&self) -> u64 {
        // Read under the lock so concurrent callers see raw values in order.
        let mut state = self.state.lock();
        let raw = (self.raw)();
        if raw < state.last {
            state.high += 1 << 32;
        }
        state.last = raw;
        state.high | u64::from(raw)
    }
}
