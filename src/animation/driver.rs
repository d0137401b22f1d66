//! Cue-driven playback state machine.

use std::cell::RefCell;
use std::rc::Rc;

use super::cursor::{Bindings, RenderTrigger, SequenceCursor};
use super::{CueEvent, CueInfo};

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Active,
}

/// Maps cue events onto a sequence cursor and a render trigger.
///
/// | state  | event | action                              | next   |
/// |--------|-------|-------------------------------------|--------|
/// | any    | Start | `set_index(0)`                      | Active |
/// | Active | Tick  | `next_clamped()`, render            | Active |
/// | Active | End   | `set_index(N - 1)`                  | Idle   |
/// | Idle   | Tick/End | ignored                          | Idle   |
///
/// Both collaborators are held weakly; an unset or dropped collaborator is
/// skipped.
///
/// Usage:
/// ```ignore
/// let reader = Rc::new(RefCell::new(SequenceReader::open_directory(dir, NrrdDecoder)?));
/// let mut driver = AnimationDriver::new();
/// driver.set_target(&reader);
/// driver.set_render_trigger(&renderer);
/// driver.run(AnimationCue::for_frames(n, 10.0).events());
/// ```
#[derive(Default)]
pub struct AnimationDriver {
    state: DriverState,
    bindings: Bindings,
    ticks: u64,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target<T: SequenceCursor + 'static>(&mut self, target: &Rc<RefCell<T>>) {
        self.bindings.set_target(target);
    }

    pub fn clear_target(&mut self) {
        self.bindings.clear_target();
    }

    pub fn set_render_trigger<R: RenderTrigger + 'static>(&mut self, renderer: &Rc<RefCell<R>>) {
        self.bindings.set_renderer(renderer);
    }

    pub fn clear_render_trigger(&mut self) {
        self.bindings.clear_renderer();
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Ticks handled while active, across all runs.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Dispatch one timeline event.
    pub fn observe(&mut self, event: &CueEvent) {
        match event {
            CueEvent::Start(info) => self.start(info),
            CueEvent::Tick(info) => self.tick(info),
            CueEvent::End(info) => self.end(info),
        }
    }

    /// Dispatch every event of a stream in order.
    pub fn run<I: IntoIterator<Item = CueEvent>>(&mut self, events: I) {
        for event in events {
            self.observe(&event);
        }
    }

    pub fn start(&mut self, info: &CueInfo) {
        log::debug!("Cue start at t={}", info.animation_time);
        self.state = DriverState::Active;
        self.bindings.with_target(|cursor| cursor.set_index(0));
    }

    pub fn tick(&mut self, info: &CueInfo) {
        if self.state == DriverState::Idle {
            log::debug!("Ignoring tick at t={} while idle", info.animation_time);
            return;
        }
        self.ticks += 1;
        self.bindings.with_target(|cursor| cursor.next_clamped());
        self.bindings.render();
    }

    pub fn end(&mut self, info: &CueInfo) {
        if self.state == DriverState::Idle {
            log::debug!("Ignoring end at t={} while idle", info.animation_time);
            return;
        }
        log::debug!("Cue end at t={}", info.animation_time);
        self.bindings.with_target(|cursor| {
            let last = cursor.len() as i64 - 1;
            cursor.set_index(last);
        });
        self.state = DriverState::Idle;
    }
}
