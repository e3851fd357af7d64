mod counter;
mod sync;
mod trace;

use std::sync::{Arc, Mutex};

use crate::scene::{SceneContext, SceneHooks};

/// Hook calls observed by a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Begin,
    Enter,
    Update(u64),
    Exit,
    Reset,
}

#[derive(Clone, Default)]
pub(crate) struct Recorder {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub stop_after: Option<u64>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| call(c)).count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SceneHooks for Recorder {
    fn begin(&mut self, _ctx: &mut SceneContext<'_>) {
        self.push(Call::Begin);
    }

    fn enter(&mut self, _ctx: &mut SceneContext<'_>) {
        self.push(Call::Enter);
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        self.push(Call::Update(ctx.frame()));
        if self.stop_after.map_or(false, |n| ctx.frame() >= n) {
            ctx.stop();
        }
    }

    fn exit(&mut self, _ctx: &mut SceneContext<'_>) {
        self.push(Call::Exit);
    }

    fn reset(&mut self, _ctx: &mut SceneContext<'_>) {
        self.push(Call::Reset);
    }
}

pub(crate) fn is_update(call: &Call) -> bool {
    matches!(call, Call::Update(_))
}
