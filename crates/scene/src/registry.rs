//! Scene registry and cooperative poll loop.
//!
//! The registry owns every scene in insertion order and is the only thing a
//! host main loop touches each cycle: `update()` polls running scenes and
//! dispatches those that are due or owe an exit. By-name operations resolve
//! the first scene with a matching name and report `false`/`None` when there
//! is none.

use core::any::Any;
use core::fmt;

use log::{debug, trace};

use crate::clock::ClockRef;
use crate::scene::{Scene, SceneHandle, SceneHooks, SceneRef, SceneRunnable};
use crate::sync::Arc;
use crate::trace::{self as records, TraceHook};

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Label used in log lines and idle trace records.
    pub name: &'static str,
    /// Scenes preallocated in storage.
    pub capacity: usize,
    /// Called at the end of an `update()` that dispatched nothing.
    pub idle_callback: Option<fn()>,
    /// Let `update()` deliver a pending exit to a paused scene.
    pub poll_exit_while_paused: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "scenes",
            capacity: 8,
            idle_callback: None,
            poll_exit_while_paused: true,
        }
    }
}

impl RegistryConfig {
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }
}

/// Builder for [`RegistryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Sets the registry name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets how many scenes to preallocate.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the idle callback function.
    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    /// Chooses whether paused scenes still receive a pending exit on poll.
    pub fn poll_exit_while_paused(mut self, enabled: bool) -> Self {
        self.config.poll_exit_while_paused = enabled;
        self
    }

    pub fn build(self) -> RegistryConfig {
        self.config
    }
}

pub struct RegistryBuilder {
    config: RegistryConfig,
    clock: ClockRef,
    trace: Option<TraceHook>,
}

impl RegistryBuilder {
    pub fn new(clock: ClockRef) -> Self {
        Self {
            config: RegistryConfig::default(),
            clock,
            trace: None,
        }
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> SceneRegistry {
        SceneRegistry {
            scenes: Vec::with_capacity(self.config.capacity),
            config: self.config,
            clock: self.clock,
            trace: self.trace,
        }
    }
}

struct Entry {
    scene: SceneRef,
    typed: Arc<dyn Any + Send + Sync>,
}

/// Insertion-ordered collection of shared scenes.
///
/// Every handle given out is a second owner: erasing a scene only drops the
/// registry's reference.
pub struct SceneRegistry {
    config: RegistryConfig,
    clock: ClockRef,
    scenes: Vec<Entry>,
    trace: Option<TraceHook>,
}

impl SceneRegistry {
    pub fn new(clock: ClockRef) -> Self {
        RegistryBuilder::new(clock).build()
    }

    pub fn builder(clock: ClockRef) -> RegistryBuilder {
        RegistryBuilder::new(clock)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn clock(&self) -> ClockRef {
        Arc::clone(&self.clock)
    }

    pub fn trace_hook(&self) -> Option<TraceHook> {
        self.trace.clone()
    }

    /// Creates a scene, appends it, delivers `begin` and returns a handle.
    ///
    /// Names are not checked for uniqueness; by-name lookups find the first.
    pub fn add<H: SceneHooks>(
        &mut self,
        name: impl Into<String>,
        fps: f64,
        hooks: H,
    ) -> SceneHandle<H> {
        let scene = Scene::new(name, fps, hooks, self.clock(), self.trace.clone());
        self.scenes.push(Entry {
            scene: Arc::clone(&scene) as SceneRef,
            typed: Arc::clone(&scene) as Arc<dyn Any + Send + Sync>,
        });
        debug!(
            "{}: added scene `{}` at {}fps",
            self.config.name,
            scene.name(),
            scene.frame_rate()
        );
        scene.begin();
        scene
    }

    /// [`SceneRegistry::add`] with hooks built by `Default`.
    pub fn add_default<H: SceneHooks + Default>(
        &mut self,
        name: impl Into<String>,
        fps: f64,
    ) -> SceneHandle<H> {
        self.add(name, fps, H::default())
    }

    /// [`SceneRegistry::add`] with a finite life of `life_sec` seconds.
    pub fn add_with_life<H: SceneHooks>(
        &mut self,
        name: impl Into<String>,
        fps: f64,
        life_sec: f64,
        hooks: H,
    ) -> SceneHandle<H> {
        let scene = self.add(name, fps, hooks);
        scene.set_duration(life_sec);
        scene
    }

    /// Poll tick. Dispatches every running scene that owes an exit or is due
    /// and returns how many were dispatched. Each scene is dispatched at most
    /// once per call, in insertion order.
    pub fn update(&mut self) -> usize {
        let mut dispatched = 0;
        for entry in &self.scenes {
            let scene = &entry.scene;
            let pollable = scene.is_running()
                || (self.config.poll_exit_while_paused && scene.is_stopping());
            if !pollable {
                continue;
            }
            // Exit first so a frame is never consumed without an update.
            if scene.has_exit() || scene.is_due() {
                scene.call_update();
                dispatched += 1;
            }
        }

        if dispatched == 0 {
            trace!("{}: idle", self.config.name);
            records::emit(self.trace.as_ref(), records::SCENE_IDLE, 0, self.config.name);
            if let Some(idle) = self.config.idle_callback {
                idle();
            }
        }
        dispatched
    }

    pub fn start(&self) {
        for entry in &self.scenes {
            entry.scene.start();
        }
    }

    pub fn stop(&self) {
        for entry in &self.scenes {
            entry.scene.stop();
        }
    }

    /// Stops every scene, delivering `exit` immediately, then starts it again.
    pub fn restart(&self) {
        for entry in &self.scenes {
            restart_now(&entry.scene);
        }
    }

    pub fn reset(&self) {
        for entry in &self.scenes {
            entry.scene.reset();
        }
    }

    pub fn play(&self) {
        for entry in &self.scenes {
            entry.scene.play();
        }
    }

    pub fn pause(&self) {
        for entry in &self.scenes {
            entry.scene.pause();
        }
    }

    pub fn start_scene(&self, name: &str) -> bool {
        self.with_scene(name, |scene| scene.start())
    }

    /// Starts `name` with its elapsed time set to `sec`.
    pub fn start_from(&self, name: &str, sec: f64) -> bool {
        self.with_scene(name, |scene| scene.start_from(sec))
    }

    /// Stops `name` and delivers its `exit` before returning.
    pub fn stop_scene(&self, name: &str) -> bool {
        self.with_scene(name, |scene| {
            scene.stop();
            scene.call_update();
        })
    }

    pub fn restart_scene(&self, name: &str) -> bool {
        self.with_scene(name, restart_now)
    }

    pub fn reset_scene(&self, name: &str) -> bool {
        self.with_scene(name, |scene| scene.reset())
    }

    pub fn play_scene(&self, name: &str) -> bool {
        self.with_scene(name, |scene| scene.play())
    }

    pub fn pause_scene(&self, name: &str) -> bool {
        self.with_scene(name, |scene| scene.pause())
    }

    pub fn set_frame_rate(&self, name: &str, fps: f64) -> bool {
        self.with_scene(name, |scene| scene.control().set_frame_rate(fps))
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.find(name).map_or(false, |scene| scene.is_running())
    }

    /// Would `name` be due if polled now? Does not consume the frame.
    pub fn is_next(&self, name: &str) -> bool {
        self.find(name).map_or(false, |scene| scene.control().is_next())
    }

    pub fn frame(&self, name: &str) -> Option<u64> {
        self.find(name).map(|scene| scene.frame())
    }

    /// True when no scene is running, paused or stopping.
    pub fn all_stopped(&self) -> bool {
        self.scenes
            .iter()
            .all(|entry| !entry.scene.is_running() && !entry.scene.is_pausing())
    }

    /// Removes every scene named `name` without delivering any hook and
    /// returns how many were removed. Outstanding handles stay valid.
    pub fn erase(&mut self, name: &str) -> usize {
        let before = self.scenes.len();
        let trace_hook = self.trace.clone();
        self.scenes.retain(|entry| {
            let keep = entry.scene.name() != name;
            if !keep {
                records::emit(
                    trace_hook.as_ref(),
                    records::SCENE_ERASE,
                    entry.scene.frame(),
                    name,
                );
            }
            keep
        });
        let removed = before - self.scenes.len();
        if removed > 0 {
            debug!("{}: erased {removed} scene(s) named `{name}`", self.config.name);
        }
        removed
    }

    pub fn get_scene_by_name(&self, name: &str) -> Option<SceneRef> {
        self.find(name).map(Arc::clone)
    }

    /// Typed lookup; `None` when absent or when the first match is not `H`.
    pub fn get_scene_as<H: SceneHooks>(&self, name: &str) -> Option<SceneHandle<H>> {
        self.scenes
            .iter()
            .find(|entry| entry.scene.name() == name)
            .and_then(downcast)
    }

    pub fn get(&self, index: usize) -> Option<SceneRef> {
        self.scenes.get(index).map(|entry| Arc::clone(&entry.scene))
    }

    pub fn get_as<H: SceneHooks>(&self, index: usize) -> Option<SceneHandle<H>> {
        self.scenes.get(index).and_then(downcast)
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scenes.iter().map(|entry| entry.scene.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneRef> + '_ {
        self.scenes.iter().map(|entry| &entry.scene)
    }

    fn find(&self, name: &str) -> Option<&SceneRef> {
        self.iter().find(|scene| scene.name() == name)
    }

    fn with_scene(&self, name: &str, f: impl FnOnce(&SceneRef)) -> bool {
        match self.find(name) {
            Some(scene) => {
                f(scene);
                true
            }
            None => {
                trace!("{}: no scene named `{name}`", self.config.name);
                false
            }
        }
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("config", &self.config)
            .field("scenes", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn restart_now(scene: &SceneRef) {
    scene.stop();
    scene.call_update();
    scene.start();
}

fn downcast<H: SceneHooks>(entry: &Entry) -> Option<SceneHandle<H>> {
    Arc::clone(&entry.typed).downcast::<Scene<H>>().ok()
}
