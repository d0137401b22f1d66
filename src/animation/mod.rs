//! Playback of a volume sequence from timeline events and key presses.
//!
//! An external clock (here [`AnimationCue`]) produces [`CueEvent`]s. The
//! [`AnimationDriver`] turns each one into a cursor move and, for ticks, a
//! render request. [`Interactor`] does the same for key commands, using
//! wrapping steps instead of clamped ones.

mod cue;
mod cursor;
mod driver;
mod interaction;

pub use cue::{AnimationCue, CueEvent, CueEvents, CueInfo};
pub use cursor::{RenderTrigger, SequenceCursor};
pub use driver::{AnimationDriver, DriverState};
pub use interaction::{Interactor, KeyCommand};
