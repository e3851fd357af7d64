//! Scene lifecycle state machine.
//!
//! A scene is a named unit of behavior with its own update cadence. Its
//! lifecycle is `Stopped -> Running <-> Paused -> Stopped`, and two pending
//! flags guarantee hook ordering:
//!
//! - after `start`, exactly one `enter` is delivered before the first
//!   `update`;
//! - after `stop` (or when a finite life runs out), exactly one `exit` is
//!   delivered and nothing else until the next `start`.
//!
//! Operations that are not valid in the current state are ignored.

use core::fmt;

use log::{debug, trace};

use crate::clock::ClockRef;
use crate::counter::{sec_to_usec, usec_to_sec, FrameRateCounter};
use crate::sync::{Arc, Mutex};
use crate::trace::{self as records, TraceHook};

/// Lifecycle state of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(label)
    }
}

/// Read-only view of the scene handed to every hook.
///
/// Hooks run with their hook value locked, so a hook must not call
/// `with_hooks`, `call_update`, `begin` or `reset` on its own scene; those
/// would deadlock. The lifecycle state is not locked during a hook. The
/// context carries what hooks usually need and lets them request a stop,
/// which is applied as soon as the hook returns.
pub struct SceneContext<'a> {
    name: &'a str,
    frame: u64,
    elapsed_usec: u64,
    fps: f64,
    remaining_usec: Option<u64>,
    stop_requested: bool,
}

impl<'a> SceneContext<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn usec64(&self) -> u64 {
        self.elapsed_usec
    }

    pub fn msec(&self) -> u64 {
        self.elapsed_usec / 1_000
    }

    pub fn sec(&self) -> f64 {
        usec_to_sec(self.elapsed_usec)
    }

    pub fn frame_rate(&self) -> f64 {
        self.fps
    }

    /// Remaining finite life in seconds, if one is configured.
    pub fn remaining_time(&self) -> Option<f64> {
        self.remaining_usec.map(usec_to_sec)
    }

    /// Asks for the scene to be stopped once the hook returns.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

/// Behavior of a concrete scene.
///
/// Only `update` is required. `begin` runs once when the scene is added to a
/// registry, `enter` on every transition into running via `start`, `exit`
/// on every stop, and `reset` when the scene's counter is reset.
pub trait SceneHooks: Send + 'static {
    fn begin(&mut self, _ctx: &mut SceneContext<'_>) {}
    fn enter(&mut self, _ctx: &mut SceneContext<'_>) {}
    fn update(&mut self, ctx: &mut SceneContext<'_>);
    fn exit(&mut self, _ctx: &mut SceneContext<'_>) {}
    fn reset(&mut self, _ctx: &mut SceneContext<'_>) {}
}

/// What one dispatch delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Exit,
    EnterUpdate,
    Update,
}

struct SceneCore {
    state: SceneState,
    pending_enter: bool,
    pending_exit: bool,
    counter: FrameRateCounter,
}

impl SceneCore {
    fn begin_stop(&mut self) -> bool {
        if self.state == SceneState::Stopped || self.pending_exit {
            return false;
        }
        self.pending_exit = true;
        self.pending_enter = false;
        true
    }

    fn begin_start(&mut self) -> bool {
        if self.pending_exit {
            return false;
        }
        match self.state {
            SceneState::Stopped => self.counter.restart(),
            SceneState::Paused => self.counter.resume(),
            SceneState::Running => return false,
        }
        self.state = SceneState::Running;
        self.pending_enter = true;
        true
    }

    fn life_expired(&self) -> bool {
        self.state != SceneState::Stopped && self.counter.has_finite_life_expired()
    }

    fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.life_expired() {
            self.begin_stop();
        }
        if self.pending_exit {
            self.pending_exit = false;
            self.state = SceneState::Stopped;
            self.counter.pause();
            return Some(Dispatch::Exit);
        }
        if self.state != SceneState::Running {
            return None;
        }
        if self.pending_enter {
            self.pending_enter = false;
            Some(Dispatch::EnterUpdate)
        } else {
            Some(Dispatch::Update)
        }
    }

    fn context<'a>(&self, name: &'a str) -> SceneContext<'a> {
        SceneContext {
            name,
            frame: self.counter.frame(),
            elapsed_usec: self.counter.elapsed_usec(),
            fps: self.counter.frame_rate(),
            remaining_usec: self.counter.remaining_usec(),
            stop_requested: false,
        }
    }
}

/// Hook-independent part of a scene: name, lifecycle flags and counter.
pub struct SceneControl {
    name: String,
    core: Mutex<SceneCore>,
    trace: Option<TraceHook>,
}

impl SceneControl {
    fn new(name: String, fps: f64, clock: ClockRef, trace: Option<TraceHook>) -> Self {
        let mut counter = FrameRateCounter::new(clock, fps);
        counter.pause();
        Self {
            name,
            core: Mutex::new(SceneCore {
                state: SceneState::Stopped,
                pending_enter: false,
                pending_exit: false,
                counter,
            }),
            trace,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stopped or paused -> running. Delivers `enter` on the next dispatch.
    ///
    /// From stopped the counter restarts from zero; from paused it resumes.
    pub fn start(&self) {
        if self.core.lock().begin_start() {
            debug!("scene `{}` started", self.name);
        }
    }

    /// Like [`SceneControl::start`], then sets elapsed time to `sec`.
    pub fn start_from(&self, sec: f64) {
        let mut core = self.core.lock();
        if core.begin_start() {
            core.counter.set_time(sec);
            debug!("scene `{}` started from {sec}s", self.name);
        }
    }

    /// Paused -> running without a new `enter`.
    pub fn play(&self) {
        let mut core = self.core.lock();
        if core.state == SceneState::Paused && !core.pending_exit {
            core.counter.resume();
            core.state = SceneState::Running;
            debug!("scene `{}` resumed", self.name);
        }
    }

    /// Running -> paused. Elapsed time freezes; no hook fires.
    pub fn pause(&self) {
        let mut core = self.core.lock();
        if core.state == SceneState::Running && !core.pending_exit {
            core.counter.pause();
            core.state = SceneState::Paused;
            debug!("scene `{}` paused", self.name);
        }
    }

    /// Running or paused -> stopping. `exit` is delivered on the next dispatch.
    pub fn stop(&self) {
        if self.core.lock().begin_stop() {
            debug!("scene `{}` stopping", self.name);
        }
    }

    pub fn state(&self) -> SceneState {
        self.core.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SceneState::Running
    }

    pub fn is_pausing(&self) -> bool {
        self.state() == SceneState::Paused
    }

    /// True only between `stop` and the delivery of `exit`.
    pub fn is_stopping(&self) -> bool {
        self.core.lock().pending_exit
    }

    /// True while `enter` is still owed.
    pub fn is_entering(&self) -> bool {
        self.core.lock().pending_enter
    }

    /// An exit is pending, or the finite life has run out.
    pub fn has_exit(&self) -> bool {
        let core = self.core.lock();
        core.pending_exit || core.life_expired()
    }

    /// Consumes the next frame if it is due.
    pub fn is_due(&self) -> bool {
        let mut core = self.core.lock();
        core.state == SceneState::Running && core.counter.is_due()
    }

    /// Would the next frame be due now? Does not consume it.
    pub fn is_next(&self) -> bool {
        let core = self.core.lock();
        core.state == SceneState::Running && core.counter.peek_due()
    }

    pub fn frame(&self) -> u64 {
        self.core.lock().counter.frame()
    }

    pub fn usec64(&self) -> u64 {
        self.core.lock().counter.usec64()
    }

    pub fn usec(&self) -> u32 {
        self.core.lock().counter.usec()
    }

    pub fn msec(&self) -> u64 {
        self.core.lock().counter.msec()
    }

    pub fn sec(&self) -> f64 {
        self.core.lock().counter.sec()
    }

    pub fn frame_rate(&self) -> f64 {
        self.core.lock().counter.frame_rate()
    }

    pub fn set_frame_rate(&self, fps: f64) {
        self.core.lock().counter.set_frame_rate(fps);
    }

    pub fn set_offset(&self, sec: f64) {
        self.core.lock().counter.set_offset(sec);
    }

    pub fn add_offset(&self, sec: f64) {
        self.core.lock().counter.add_offset(sec);
    }

    pub fn set_offset_usec(&self, usec: i64) {
        self.core.lock().counter.set_offset_usec(usec);
    }

    pub fn add_offset_usec(&self, usec: i64) {
        self.core.lock().counter.add_offset_usec(usec);
    }

    pub fn set_time(&self, sec: f64) {
        self.core.lock().counter.set_time(sec);
    }

    /// Gives the scene a finite life; it stops itself once elapsed time
    /// reaches `sec`. Non-positive or non-finite values clear the life.
    pub fn set_duration(&self, sec: f64) {
        let life = if sec.is_finite() && sec > 0.0 {
            Some(sec_to_usec(sec) as u64)
        } else {
            if !sec.is_finite() || sec < 0.0 {
                log::warn!("scene `{}`: ignoring duration {sec}s", self.name);
            }
            None
        };
        self.core.lock().counter.set_life_usec(life);
    }

    pub fn clear_duration(&self) {
        self.core.lock().counter.set_life_usec(None);
    }

    /// Configured finite life in seconds.
    pub fn duration(&self) -> Option<f64> {
        self.core.lock().counter.life_usec().map(usec_to_sec)
    }

    /// Seconds left before the finite life runs out, clamped at zero.
    pub fn remaining_time(&self) -> Option<f64> {
        self.core.lock().counter.remaining_usec().map(usec_to_sec)
    }

    /// Reads the same deadline as [`SceneControl::remaining_time`].
    pub fn remaining_life(&self) -> Option<f64> {
        self.remaining_time()
    }

    fn emit(&self, record: u8, frame: u64) {
        records::emit(self.trace.as_ref(), record, frame, &self.name);
    }
}

impl fmt::Debug for SceneControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("state", &core.state)
            .field("pending_enter", &core.pending_enter)
            .field("pending_exit", &core.pending_exit)
            .field("counter", &core.counter)
            .finish()
    }
}

/// Object-safe interface used by the registry.
pub trait SceneRunnable: Send + Sync {
    fn control(&self) -> &SceneControl;

    /// Delivers the one-time `begin` hook.
    fn begin(&self);

    /// Lifecycle dispatcher: a pending exit preempts everything, otherwise a
    /// pending enter is delivered before the update.
    fn call_update(&self);

    /// Resets the counter and delivers the `reset` hook. State is unchanged.
    fn reset(&self);

    fn name(&self) -> &str {
        self.control().name()
    }

    fn start(&self) {
        self.control().start();
    }

    fn start_from(&self, sec: f64) {
        self.control().start_from(sec);
    }

    fn play(&self) {
        self.control().play();
    }

    fn pause(&self) {
        self.control().pause();
    }

    fn stop(&self) {
        self.control().stop();
    }

    fn state(&self) -> SceneState {
        self.control().state()
    }

    fn is_running(&self) -> bool {
        self.control().is_running()
    }

    fn is_pausing(&self) -> bool {
        self.control().is_pausing()
    }

    fn is_stopping(&self) -> bool {
        self.control().is_stopping()
    }

    fn has_exit(&self) -> bool {
        self.control().has_exit()
    }

    fn is_due(&self) -> bool {
        self.control().is_due()
    }

    fn frame(&self) -> u64 {
        self.control().frame()
    }
}

/// Shared handle to a scene of any type.
pub type SceneRef = Arc<dyn SceneRunnable>;

/// Shared handle to a scene of a known hook type.
pub type SceneHandle<H> = Arc<Scene<H>>;

/// Concrete scene: lifecycle control plus user hooks.
pub struct Scene<H: SceneHooks> {
    control: SceneControl,
    hooks: Mutex<H>,
}

impl<H: SceneHooks> Scene<H> {
    /// Creates a stopped scene. `begin` is not delivered here; the registry
    /// does that on `add`.
    pub fn new(
        name: impl Into<String>,
        fps: f64,
        hooks: H,
        clock: ClockRef,
        trace: Option<TraceHook>,
    ) -> Arc<Self> {
        Arc::new(Self {
            control: SceneControl::new(name.into(), fps, clock, trace),
            hooks: Mutex::new(hooks),
        })
    }

    /// Runs `f` with exclusive access to the hook value.
    ///
    /// Must not be called from inside one of this scene's hooks.
    pub fn with_hooks<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.hooks.lock())
    }

    fn run_hook(&self, hook: impl FnOnce(&mut H, &mut SceneContext<'_>)) -> bool {
        let mut ctx = self.control.core.lock().context(&self.control.name);
        hook(&mut self.hooks.lock(), &mut ctx);
        ctx.stop_requested
    }

    fn dispatch(&self) -> Option<Dispatch> {
        let mut core = self.control.core.lock();
        core.next_dispatch()
    }
}

impl<H: SceneHooks> core::ops::Deref for Scene<H> {
    type Target = SceneControl;

    fn deref(&self) -> &SceneControl {
        &self.control
    }
}

impl<H: SceneHooks> SceneRunnable for Scene<H> {
    fn control(&self) -> &SceneControl {
        &self.control
    }

    fn begin(&self) {
        let stop = self.run_hook(|hooks, ctx| hooks.begin(ctx));
        self.control.emit(records::SCENE_ADD, 0);
        if stop {
            self.control.stop();
        }
    }

    fn call_update(&self) {
        let Some(step) = self.dispatch() else {
            return;
        };

        if step == Dispatch::Exit {
            // The scene is already stopped, so a stop request here is moot.
            self.run_hook(|hooks, ctx| hooks.exit(ctx));
            debug!("scene `{}` exited", self.control.name);
            self.control.emit(records::SCENE_EXIT, self.control.frame());
            return;
        }

        if step == Dispatch::EnterUpdate {
            let stop = self.run_hook(|hooks, ctx| hooks.enter(ctx));
            debug!("scene `{}` entered", self.control.name);
            self.control.emit(records::SCENE_ENTER, self.control.frame());
            if stop {
                self.control.stop();
                return;
            }
        }

        let stop = self.run_hook(|hooks, ctx| hooks.update(ctx));
        let frame = self.control.frame();
        trace!("scene `{}` update at frame {frame}", self.control.name);
        self.control.emit(records::SCENE_UPDATE, frame);
        if stop {
            self.control.stop();
        }
    }

    fn reset(&self) {
        self.control.core.lock().counter.reset();
        let stop = self.run_hook(|hooks, ctx| hooks.reset(ctx));
        debug!("scene `{}` reset", self.control.name);
        self.control.emit(records::SCENE_RESET, 0);
        if stop {
            self.control.stop();
        }
    }
}

impl<H: SceneHooks> fmt::Debug for Scene<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.control.fmt(f)
    }
}
