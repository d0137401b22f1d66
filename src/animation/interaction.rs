//! Keyboard stepping through a sequence.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use super::cursor::{Bindings, RenderTrigger, SequenceCursor};

/// Interactive command, bound to a key symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `n`: next element, wrapping to the first.
    Next,
    /// `p`: previous element, wrapping to the last.
    Previous,
    /// `space`: show every element once from the first.
    PlayThrough,
    /// `q`: stop interacting.
    Quit,
}

impl KeyCommand {
    pub fn from_key_sym(sym: &str) -> Option<Self> {
        match sym {
            "n" => Some(KeyCommand::Next),
            "p" => Some(KeyCommand::Previous),
            "space" | " " => Some(KeyCommand::PlayThrough),
            "q" | "Escape" => Some(KeyCommand::Quit),
            _ => None,
        }
    }
}

impl FromStr for KeyCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key_sym(s).ok_or_else(|| format!("unknown key '{s}'"))
    }
}

/// Applies key commands to a cursor, rendering after each change.
#[derive(Default)]
pub struct Interactor {
    bindings: Bindings,
}

impl Interactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target<T: SequenceCursor + 'static>(&mut self, target: &Rc<RefCell<T>>) {
        self.bindings.set_target(target);
    }

    pub fn set_render_trigger<R: RenderTrigger + 'static>(&mut self, renderer: &Rc<RefCell<R>>) {
        self.bindings.set_renderer(renderer);
    }

    /// Handle one command. Returns `false` once the user asked to quit.
    pub fn on_key(&mut self, command: KeyCommand) -> bool {
        match command {
            KeyCommand::Next => {
                self.bindings.with_target(|cursor| cursor.next_wrapping());
                self.bindings.render();
            }
            KeyCommand::Previous => {
                self.bindings.with_target(|cursor| cursor.previous_wrapping());
                self.bindings.render();
            }
            KeyCommand::PlayThrough => {
                let len = self.bindings.with_target(|cursor| cursor.len()).unwrap_or(0);
                self.bindings.with_target(|cursor| cursor.set_index(0));
                self.bindings.render();
                for _ in 1..len {
                    self.bindings.with_target(|cursor| cursor.next_clamped());
                    self.bindings.render();
                }
            }
            KeyCommand::Quit => return false,
        }
        true
    }
}
