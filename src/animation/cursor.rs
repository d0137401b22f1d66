//! Collaborator traits shared by the cue driver and the interactor.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::sequence::{IndexNavigator, SequenceReader};
use crate::volume::VolumeDecoder;

/// Something with a current position in a sequence.
pub trait SequenceCursor {
    /// Number of elements (N).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Option<usize>;

    /// Clamp `index` into range and make it current.
    fn set_index(&mut self, index: i64);

    fn next_clamped(&mut self);

    fn next_wrapping(&mut self);

    fn previous_wrapping(&mut self);
}

/// Redraws the current frame. Fire-and-forget.
pub trait RenderTrigger {
    fn trigger_render(&mut self);
}

impl<F: FnMut()> RenderTrigger for F {
    fn trigger_render(&mut self) {
        self()
    }
}

impl SequenceCursor for IndexNavigator {
    fn len(&self) -> usize {
        IndexNavigator::len(self)
    }

    fn current(&self) -> Option<usize> {
        IndexNavigator::current(self)
    }

    fn set_index(&mut self, index: i64) {
        IndexNavigator::set_index(self, index)
    }

    fn next_clamped(&mut self) {
        IndexNavigator::next_clamped(self)
    }

    fn next_wrapping(&mut self) {
        IndexNavigator::next_wrapping(self)
    }

    fn previous_wrapping(&mut self) {
        IndexNavigator::previous_wrapping(self)
    }
}

impl<D: VolumeDecoder> SequenceCursor for SequenceReader<D> {
    fn len(&self) -> usize {
        self.number_of_files()
    }

    fn current(&self) -> Option<usize> {
        self.current_index()
    }

    fn set_index(&mut self, index: i64) {
        SequenceReader::set_index(self, index)
    }

    fn next_clamped(&mut self) {
        SequenceReader::next_clamped(self)
    }

    fn next_wrapping(&mut self) {
        SequenceReader::next_wrapping(self)
    }

    fn previous_wrapping(&mut self) {
        SequenceReader::previous_wrapping(self)
    }
}

/// Non-owning links to a cursor and a render trigger.
///
/// Either link may be unset or dangling; operations on it are then skipped.
#[derive(Default)]
pub(crate) struct Bindings {
    target: Option<Weak<RefCell<dyn SequenceCursor>>>,
    renderer: Option<Weak<RefCell<dyn RenderTrigger>>>,
}

impl Bindings {
    pub(crate) fn set_target<T: SequenceCursor + 'static>(&mut self, target: &Rc<RefCell<T>>) {
        let target: Rc<RefCell<dyn SequenceCursor>> = target.clone();
        self.target = Some(Rc::downgrade(&target));
    }

    pub(crate) fn clear_target(&mut self) {
        self.target = None;
    }

    pub(crate) fn set_renderer<R: RenderTrigger + 'static>(&mut self, renderer: &Rc<RefCell<R>>) {
        let renderer: Rc<RefCell<dyn RenderTrigger>> = renderer.clone();
        self.renderer = Some(Rc::downgrade(&renderer));
    }

    pub(crate) fn clear_renderer(&mut self) {
        self.renderer = None;
    }

    /// Run `f` on the target. `None` if unset, dropped or already borrowed.
    pub(crate) fn with_target<R>(&self, f: impl FnOnce(&mut dyn SequenceCursor) -> R) -> Option<R> {
        let target = self.target.as_ref()?.upgrade()?;
        let Ok(mut cursor) = target.try_borrow_mut() else {
            log::warn!("Sequence cursor is busy, skipping");
            return None;
        };
        Some(f(&mut *cursor))
    }

    /// Invoke the render trigger, if any. Returns whether it ran.
    pub(crate) fn render(&self) -> bool {
        let Some(renderer) = self.renderer.as_ref().and_then(Weak::upgrade) else {
            return false;
        };
        let Ok(mut renderer) = renderer.try_borrow_mut() else {
            log::warn!("Render trigger is busy, skipping");
            return false;
        };
        renderer.trigger_render();
        true
    }
}
