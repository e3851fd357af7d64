//! Poll loop driving a scene registry on a hosted OS.
//!
//! Mirrors what a device main loop does: call `update()` as often as the
//! poll period allows, until every scene has stopped, a deadline passes or a
//! shutdown is requested.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use scene::sync::Arc;
use scene::SceneRegistry;

use crate::PortError;

/// Host loop configuration.
#[derive(Debug, Clone)]
pub struct HostLoopConfig {
    /// Time between two `update()` calls.
    pub poll_period: Duration,
    /// Stop after this much wall time.
    pub run_for: Option<Duration>,
    /// Return once no scene is running, paused or stopping.
    pub stop_when_all_stopped: bool,
}

impl Default for HostLoopConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(1),
            run_for: None,
            stop_when_all_stopped: true,
        }
    }
}

impl HostLoopConfig {
    pub fn poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period;
        self
    }

    pub fn run_for(mut self, limit: Duration) -> Self {
        self.run_for = Some(limit);
        self
    }

    pub fn stop_when_all_stopped(mut self, enabled: bool) -> Self {
        self.stop_when_all_stopped = enabled;
        self
    }
}

/// Why [`HostLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AllStopped,
    Deadline,
    Shutdown,
}

/// Counters reported when the loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    /// Number of `update()` calls.
    pub polls: u64,
    /// Scene dispatches summed over all polls.
    pub dispatched: u64,
}

pub struct HostLoop {
    config: HostLoopConfig,
    shutdown: Arc<AtomicBool>,
}

impl HostLoop {
    pub fn new(config: HostLoopConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &HostLoopConfig {
        &self.config
    }

    /// Flag that ends the loop at its next poll when set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Routes Ctrl-C to [`HostLoop::request_shutdown`]. Only one handler can
    /// be installed per process.
    pub fn install_ctrlc(&self) -> Result<(), PortError> {
        let flag = self.shutdown_flag();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
        debug!("host loop: Ctrl-C handler installed");
        Ok(())
    }

    /// Polls `registry` until a stop condition holds. On deadline or
    /// shutdown every scene is stopped and its `exit` delivered first.
    pub fn run(&self, registry: &mut SceneRegistry) -> RunSummary {
        let started = Instant::now();
        let deadline = self.config.run_for.map(|limit| started + limit);
        let mut next_poll = started;
        let mut polls = 0;
        let mut dispatched = 0;

        let reason = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break StopReason::Shutdown;
            }
            if deadline.map_or(false, |at| Instant::now() >= at) {
                break StopReason::Deadline;
            }
            if self.config.stop_when_all_stopped && registry.all_stopped() {
                break StopReason::AllStopped;
            }

            dispatched += registry.update() as u64;
            polls += 1;

            // Sleep to an absolute schedule so the period does not drift.
            next_poll += self.config.poll_period;
            let now = Instant::now();
            if next_poll > now {
                thread::sleep(next_poll - now);
            } else {
                next_poll = now;
            }
        };

        if reason != StopReason::AllStopped {
            registry.stop();
            dispatched += registry.update() as u64;
        }

        info!(
            "host loop: {reason:?} after {polls} polls, {dispatched} dispatches in {:?}",
            started.elapsed()
        );
        RunSummary {
            reason,
            polls,
            dispatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonotonicClock;
    use scene::{SceneContext, SceneHooks, SceneRunnable};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Tally(Arc<Mutex<(u32, u32)>>);

    impl SceneHooks for Tally {
        fn update(&mut self, _ctx: &mut SceneContext<'_>) {
            self.0.lock().unwrap().0 += 1;
        }

        fn exit(&mut self, _ctx: &mut SceneContext<'_>) {
            self.0.lock().unwrap().1 += 1;
        }
    }

    #[test]
    fn shutdown_before_run_returns_immediately() {
        let mut registry = SceneRegistry::new(MonotonicClock::new());
        let tally = Tally::default();
        registry.add("idle", 10.0, tally.clone());
        registry.start();

        let host = HostLoop::new(HostLoopConfig::default());
        host.request_shutdown();
        let summary = host.run(&mut registry);

        assert_eq!(summary.reason, StopReason::Shutdown);
        assert_eq!(summary.polls, 0);
        assert_eq!(*tally.0.lock().unwrap(), (0, 1), "exit delivered on shutdown");
        assert!(registry.all_stopped());
    }

    #[test]
    fn deadline_stops_running_scenes() {
        let mut registry = SceneRegistry::new(MonotonicClock::new());
        let tally = Tally::default();
        let handle = registry.add("fast", 200.0, tally.clone());
        registry.start();

        let host = HostLoop::new(HostLoopConfig::default().run_for(Duration::from_millis(60)));
        let summary = host.run(&mut registry);

        assert_eq!(summary.reason, StopReason::Deadline);
        assert!(summary.polls > 0);
        let (updates, exits) = *tally.0.lock().unwrap();
        assert!(updates > 0);
        assert_eq!(exits, 1);
        assert!(!handle.is_running());
    }

    #[test]
    fn finite_life_ends_loop_when_all_stopped() {
        let mut registry = SceneRegistry::new(MonotonicClock::new());
        let tally = Tally::default();
        registry.add_with_life("short", 100.0, 0.03, tally.clone());
        registry.start();

        let host = HostLoop::new(HostLoopConfig::default().run_for(Duration::from_secs(5)));
        let summary = host.run(&mut registry);

        assert_eq!(summary.reason, StopReason::AllStopped);
        assert_eq!(tally.0.lock().unwrap().1, 1);
    }

    #[test]
    fn empty_registry_counts_as_all_stopped() {
        let mut registry = SceneRegistry::new(MonotonicClock::new());
        let summary = HostLoop::new(HostLoopConfig::default()).run(&mut registry);
        assert_eq!(summary.reason, StopReason::AllStopped);
        assert_eq!(summary.dispatched, 0);
    }
}
