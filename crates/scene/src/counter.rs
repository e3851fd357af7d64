//! Per-scene frame-rate scheduler.
//!
//! A [`FrameRateCounter`] decides whether its scene is due for the next
//! update, counts delivered frames and reports elapsed time. Elapsed time is
//! read as `now - start + offset`; the offset only shifts the read-out and
//! never the due cadence, which is measured from the last delivered frame.

use core::fmt;

use log::warn;

use crate::clock::{elapsed_since, ClockRef};
use crate::error::SceneError;

const USEC_PER_SEC: f64 = 1_000_000.0;

/// Target update frequency in frames per second.
///
/// Zero is a valid rate: the scene is never due by time and only reacts to
/// explicit dispatch (for example a pending exit).
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct FrameRate(f64);

impl FrameRate {
    pub const ZERO: Self = Self(0.0);

    /// Checked constructor; rejects negative, NaN and infinite rates.
    pub fn new(fps: f64) -> Result<Self, SceneError> {
        if fps.is_finite() && fps >= 0.0 {
            Ok(Self(fps))
        } else {
            Err(SceneError::InvalidFrameRate(fps))
        }
    }

    /// Like [`FrameRate::new`] but falls back to zero on invalid input.
    pub fn saturating(fps: f64) -> Self {
        Self::new(fps).unwrap_or_else(|err| {
            warn!("{err}; scene will only be dispatched explicitly");
            Self::ZERO
        })
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Frame period in microseconds, `None` for a zero rate.
    pub fn interval_usec(self) -> Option<f64> {
        if self.is_zero() {
            None
        } else {
            Some(USEC_PER_SEC / self.0)
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}fps", self.0)
    }
}

/// Converts seconds to signed microseconds, rounding to nearest.
pub fn sec_to_usec(sec: f64) -> i64 {
    (sec * USEC_PER_SEC).round() as i64
}

/// Converts microseconds to seconds.
pub fn usec_to_sec(usec: u64) -> f64 {
    usec as f64 / USEC_PER_SEC
}

/// Frame scheduler with elapsed-time bookkeeping and an optional finite life.
pub struct FrameRateCounter {
    clock: ClockRef,
    rate: FrameRate,
    frame: u64,
    start_usec: u64,
    last_usec: u64,
    offset_usec: i64,
    life_usec: Option<u64>,
    paused_at: Option<u64>,
}

impl FrameRateCounter {
    /// Creates a running counter starting now.
    pub fn new(clock: ClockRef, fps: f64) -> Self {
        let now = clock.now_usec();
        Self {
            clock,
            rate: FrameRate::saturating(fps),
            frame: 0,
            start_usec: now,
            last_usec: now,
            offset_usec: 0,
            life_usec: None,
            paused_at: None,
        }
    }

    /// Returns true and advances the frame when the next frame is due.
    pub fn is_due(&mut self) -> bool {
        if !self.peek_due() {
            return false;
        }
        self.frame += 1;
        self.last_usec = self.clock.now_usec();
        true
    }

    /// Same test as [`FrameRateCounter::is_due`] without consuming the frame.
    pub fn peek_due(&self) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        match self.rate.interval_usec() {
            Some(interval) => {
                let since_last = elapsed_since(self.clock.now_usec(), self.last_usec);
                since_last as f64 >= interval
            }
            None => false,
        }
    }

    pub fn has_finite_life_expired(&self) -> bool {
        self.life_usec
            .map_or(false, |life| self.elapsed_usec() >= life)
    }

    /// Elapsed time after offset, clamped at zero. Frozen while paused.
    pub fn elapsed_usec(&self) -> u64 {
        let elapsed = self.raw_elapsed_usec().saturating_add(self.offset_usec);
        elapsed.max(0) as u64
    }

    pub fn usec64(&self) -> u64 {
        self.elapsed_usec()
    }

    /// Low 32 bits of the elapsed microseconds, wrapping like a platform
    /// `micros()` counter.
    pub fn usec(&self) -> u32 {
        self.elapsed_usec() as u32
    }

    pub fn msec(&self) -> u64 {
        self.elapsed_usec() / 1_000
    }

    pub fn sec(&self) -> f64 {
        usec_to_sec(self.elapsed_usec())
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_rate(&self) -> f64 {
        self.rate.fps()
    }

    /// Changes the target rate. Frame count and timestamps are kept, so the
    /// next due check measures the new period from the last delivered frame.
    pub fn set_frame_rate(&mut self, fps: f64) {
        self.rate = FrameRate::saturating(fps);
    }

    pub fn offset_usec(&self) -> i64 {
        self.offset_usec
    }

    pub fn set_offset_usec(&mut self, usec: i64) {
        self.offset_usec = usec;
    }

    pub fn add_offset_usec(&mut self, usec: i64) {
        self.offset_usec = self.offset_usec.saturating_add(usec);
    }

    pub fn set_offset(&mut self, sec: f64) {
        self.set_offset_usec(sec_to_usec(sec));
    }

    pub fn add_offset(&mut self, sec: f64) {
        self.add_offset_usec(sec_to_usec(sec));
    }

    /// Makes `elapsed_usec()` read `usec` right now by recomputing the offset.
    pub fn set_time_usec(&mut self, usec: u64) {
        let target = i64::try_from(usec).unwrap_or(i64::MAX);
        self.offset_usec = target.saturating_sub(self.raw_elapsed_usec());
    }

    pub fn set_time(&mut self, sec: f64) {
        self.set_time_usec(sec_to_usec(sec).max(0) as u64);
    }

    /// Zeroes frame and offset and restarts time from now. Life is kept.
    pub fn reset(&mut self) {
        let now = self.clock.now_usec();
        self.frame = 0;
        self.start_usec = now;
        self.last_usec = now;
        self.offset_usec = 0;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    /// Resets and resumes.
    pub fn restart(&mut self) {
        self.reset();
        self.resume();
    }

    /// Freezes elapsed time and due checks.
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.clock.now_usec());
        }
    }

    /// Continues from the frozen point; the paused span is not counted.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            let paused_for = elapsed_since(self.clock.now_usec(), paused_at);
            self.start_usec = self.start_usec.wrapping_add(paused_for);
            self.last_usec = self.last_usec.wrapping_add(paused_for);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn life_usec(&self) -> Option<u64> {
        self.life_usec
    }

    pub fn set_life_usec(&mut self, life: Option<u64>) {
        self.life_usec = life;
    }

    /// `life - elapsed`, clamped at zero; `None` without a finite life.
    pub fn remaining_usec(&self) -> Option<u64> {
        self.life_usec
            .map(|life| life.saturating_sub(self.elapsed_usec()))
    }

    fn raw_elapsed_usec(&self) -> i64 {
        let now = self.paused_at.unwrap_or_else(|| self.clock.now_usec());
        i64::try_from(elapsed_since(now, self.start_usec)).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for FrameRateCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRateCounter")
            .field("rate", &self.rate)
            .field("frame", &self.frame)
            .field("elapsed_usec", &self.elapsed_usec())
            .field("offset_usec", &self.offset_usec)
            .field("life_usec", &self.life_usec)
            .field("paused", &self.is_paused())
            .finish()
    }
}
