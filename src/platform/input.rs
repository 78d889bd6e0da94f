//! Keyboard mapping and held-key tracking

use crate::sim::TickInput;

/// Game actions a key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Jump,
}

impl Action {
    /// Map a `KeyboardEvent.key` value; unknown keys map to nothing
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "a" | "arrowleft" => Some(Action::Left),
            "d" | "arrowright" => Some(Action::Right),
            "w" | "arrowup" | " " => Some(Action::Jump),
            _ => None,
        }
    }
}

/// Input accumulated between simulation ticks
#[derive(Debug, Clone, Default)]
pub struct InputState {
    left: bool,
    right: bool,
    jump_pending: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press. Returns true if the key is bound.
    ///
    /// Auto-repeat presses are swallowed so holding jump does not chain into
    /// the double jump.
    pub fn key_down(&mut self, key: &str, repeat: bool) -> bool {
        match Action::from_key(key) {
            Some(Action::Left) => self.left = true,
            Some(Action::Right) => self.right = true,
            Some(Action::Jump) => {
                if !repeat {
                    self.jump_pending = true;
                }
            }
            None => return false,
        }
        true
    }

    /// Handle a key release. Returns true if the key is bound.
    pub fn key_up(&mut self, key: &str) -> bool {
        match Action::from_key(key) {
            Some(Action::Left) => self.left = false,
            Some(Action::Right) => self.right = false,
            Some(Action::Jump) => {}
            None => return false,
        }
        true
    }

    /// Drop held keys (window lost focus, keyup will never arrive)
    pub fn release_all(&mut self) {
        self.left = false;
        self.right = false;
    }

    /// Snapshot for the next tick
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            left: self.left,
            right: self.right,
            jump: self.jump_pending,
        }
    }

    /// Clear one-shot inputs after a tick consumed them
    pub fn consume_one_shots(&mut self) {
        self.jump_pending = false;
    }
}
