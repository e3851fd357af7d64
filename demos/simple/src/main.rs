//! Runs a blinking LED scene and a talking scene on the host.
//!
//! `RUST_LOG=debug scene-demo --blink-fps 2 --speak-fps 1 --run-for 5`

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, Level};
use scene::{SceneContext, SceneHooks, SceneRegistry};
use scene_posix::{log_trace_hook, HostLoop, HostLoopConfig, MonotonicClock, SceneDescriptor};

#[derive(Parser, Debug)]
#[command(author, version, about = "Frame-rate scheduled scenes on the host")]
struct Opts {
    /// Blink scene rate in frames per second.
    #[arg(long, default_value_t = 2.0, value_name = "FPS")]
    blink_fps: f64,

    /// Speak scene rate in frames per second.
    #[arg(long, default_value_t = 1.0, value_name = "FPS")]
    speak_fps: f64,

    /// Finite life of the Speak scene in seconds.
    #[arg(long, value_name = "SEC")]
    life: Option<f64>,

    /// Stop everything after this many seconds.
    #[arg(long, value_name = "SEC")]
    run_for: Option<f64>,

    /// Extra logging scene, `name:fps[:life_sec]`. Repeatable.
    #[arg(long = "scene", value_name = "SCENE")]
    scenes: Vec<SceneDescriptor>,

    /// Poll period in milliseconds.
    #[arg(long, default_value_t = 1, value_name = "MS")]
    poll_ms: u64,

    /// Log every lifecycle trace record.
    #[arg(long)]
    trace: bool,
}

/// Toggles a simulated LED each frame.
#[derive(Default)]
struct Blink {
    led: bool,
}

impl SceneHooks for Blink {
    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        self.led = !self.led;
        info!("{}: led {}", ctx.name(), if self.led { "on" } else { "off" });
    }
}

struct Speak;

impl SceneHooks for Speak {
    fn begin(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} begin()", ctx.name());
    }

    fn enter(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} enter()", ctx.name());
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        info!(
            "Scene {} update() at frame = {}, time = {}",
            ctx.name(),
            ctx.frame(),
            ctx.msec()
        );
    }

    fn exit(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} exit() after {} frames", ctx.name(), ctx.frame());
    }
}

/// Reports every hook.
struct Empty;

impl SceneHooks for Empty {
    fn begin(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} begin() at fps = {}", ctx.name(), ctx.frame_rate());
    }

    fn enter(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} enter()", ctx.name());
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} update() at frame = {}", ctx.name(), ctx.frame());
    }

    fn exit(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} exit()", ctx.name());
    }

    fn reset(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Scene {} reset()", ctx.name());
    }
}

fn seconds(label: &str, sec: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(sec).with_context(|| format!("invalid {label}: {sec}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let mut builder = SceneRegistry::builder(MonotonicClock::new());
    if opts.trace {
        builder = builder.with_trace_hook(log_trace_hook(Level::Debug));
    }
    let mut scenes = builder.build();

    scenes.add_default::<Blink>("Blink", opts.blink_fps);
    match opts.life {
        Some(life) => {
            scenes.add_with_life("Speak", opts.speak_fps, life, Speak);
        }
        None => {
            scenes.add("Speak", opts.speak_fps, Speak);
        }
    }
    for descriptor in &opts.scenes {
        descriptor.add_to(&mut scenes, Empty);
    }

    let mut config = HostLoopConfig::default().poll_period(Duration::from_millis(opts.poll_ms));
    if let Some(sec) = opts.run_for {
        config = config.run_for(seconds("--run-for", sec)?);
    }
    let host = HostLoop::new(config);
    if let Err(err) = host.install_ctrlc() {
        warn!("{err}; Ctrl-C will terminate without exit hooks");
    }

    scenes.start();
    let summary = host.run(&mut scenes);
    info!(
        "stopped ({:?}): {} polls, {} dispatches",
        summary.reason, summary.polls, summary.dispatched
    );
    Ok(())
}
