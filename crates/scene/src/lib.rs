//! # scene
//!
//! Named, independently scheduled *scenes* cooperatively time-sliced on a
//! single main loop. Each scene has its own lifecycle and its own target
//! update frequency; the host calls [`SceneRegistry::update`] once per loop
//! iteration and the registry dispatches whichever scenes are due.
//!
//! ## Module Overview
//! - [`clock`]    – Microsecond time sources and wrap-safe arithmetic.
//! - [`counter`]  – Per-scene frame-rate scheduler with elapsed time, offset
//!   and finite life.
//! - [`scene`]    – Scene lifecycle state machine and user hooks.
//! - [`registry`] – Shared-ownership scene collection and the poll loop.
//! - [`trace`]    – Lifecycle trace records.
//!
//! ```
//! use scene::{ManualClock, SceneContext, SceneHooks, SceneRegistry};
//!
//! #[derive(Default)]
//! struct Blink {
//!     on: bool,
//! }
//!
//! impl SceneHooks for Blink {
//!     fn update(&mut self, _ctx: &mut SceneContext<'_>) {
//!         self.on = !self.on;
//!     }
//! }
//!
//! let clock = ManualClock::new(0);
//! let mut scenes = SceneRegistry::new(clock.clone());
//! let blink = scenes.add_default::<Blink>("blink", 2.0);
//! scenes.start();
//!
//! clock.advance_msec(500);
//! scenes.update();
//! assert!(blink.with_hooks(|b| b.on));
//! ```

pub mod clock;
pub mod counter;
pub mod error;
pub mod registry;
pub mod scene;
pub mod sync;
pub mod trace;

pub use clock::{Clock, ClockRef, ManualClock, WrappingMicros};
pub use counter::{FrameRate, FrameRateCounter};
pub use error::{SceneError, TraceError};
pub use registry::{RegistryBuilder, RegistryConfig, RegistryConfigBuilder, SceneRegistry};
pub use scene::{
    Scene, SceneContext, SceneControl, SceneHandle, SceneHooks, SceneRef, SceneRunnable,
    SceneState,
};
pub use trace::TraceHook;
#[cfg(test)]
mod tests;
