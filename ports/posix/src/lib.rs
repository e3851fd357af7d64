//! Host (POSIX) port for the scene scheduler.
//!
//! The core crate only consumes a [`Clock`]; this crate supplies one backed by
//! `std::time::Instant`, a poll loop that drives a [`SceneRegistry`](scene::SceneRegistry) the way
//! a device main loop would, a trace hook that forwards lifecycle records to
//! the `log` facade, and a parser for textual scene descriptors.

use std::time::Instant;

use log::Level;
use scene::sync::Arc;
use scene::trace::{self, TraceHook};
use scene::Clock;
use thiserror::Error;

mod descriptor;
mod runtime;

pub use descriptor::SceneDescriptor;
pub use runtime::{HostLoop, HostLoopConfig, RunSummary, StopReason};

/// Errors raised while setting up the host port.
#[derive(Error, Debug)]
pub enum PortError {
    #[error("failed to install Ctrl-C handler: {0}")]
    CtrlC(#[from] ctrlc::Error),
}

/// Monotonic microsecond clock starting at zero when created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
        })
    }
}

impl Clock for MonotonicClock {
    fn now_usec(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Trace hook that writes every lifecycle record as a log line at `level`.
///
/// Records refused by [`trace::check`] are not logged and the error is
/// returned to the caller.
pub fn log_trace_hook(level: Level) -> TraceHook {
    Arc::new(move |record: u8, payload: &[u8], _timestamp: bool| -> trace::TraceResult {
        trace::check(record, payload)?;
        match trace::decode(payload) {
            Some((frame, name)) => {
                log::log!(level, "[{}] {name} frame={frame}", trace::record_name(record));
            }
            None => log::log!(level, "[{}] {} bytes", trace::record_name(record), payload.len()),
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::TraceError;

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let first = clock.now_usec();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = clock.now_usec();
        assert!(second >= first + 1_000, "{first} -> {second}");
    }

    #[test]
    fn log_trace_hook_accepts_records() {
        let hook = log_trace_hook(Level::Debug);
        let mut buf = [0u8; 8 + trace::MAX_NAME_LEN];
        let len = trace::encode(&mut buf, 3, "blink");
        assert!(hook(trace::SCENE_UPDATE, &buf[..len], true).is_ok());
        assert!(hook(trace::SCENE_IDLE, &[1, 2], false).is_ok());
    }

    #[test]
    fn log_trace_hook_refuses_foreign_records() {
        let hook = log_trace_hook(Level::Debug);
        assert_eq!(hook(0x2a, &[], true), Err(TraceError::Rejected(0x2a)));

        let oversized = vec![0u8; 8 + trace::MAX_NAME_LEN + 4];
        assert_eq!(
            hook(trace::SCENE_ENTER, &oversized, true),
            Err(TraceError::PayloadTooLarge(oversized.len()))
        );
    }
}
