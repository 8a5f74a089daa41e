//! Platform abstraction layer
//!
//! Turns raw key and touch events into the per-frame input snapshot the
//! simulation polls. Event listeners feed `KeyState`; the frame loop calls
//! `snapshot()` exactly once per frame.

use std::collections::HashSet;

use glam::Vec2;

use crate::sim::TickInput;

/// Wall-clock time in Unix milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Wall-clock time in Unix milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Anything that can produce a frame's input snapshot
pub trait InputSource {
    fn snapshot(&self) -> TickInput;
}

/// Keyboard shortcuts outside the movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Escape: pause, resume, or back out of an overlay
    Back,
    /// P: pause while playing
    Pause,
}

impl Shortcut {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Escape" => Some(Shortcut::Back),
            "KeyP" => Some(Shortcut::Pause),
            _ => None,
        }
    }
}

/// Held keys plus the active touch point
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: HashSet<String>,
    touch: Option<Vec2>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `KeyboardEvent.code` going down
    pub fn key_down(&mut self, code: &str) {
        self.held.insert(code.to_string());
    }

    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    /// Touch start/move at field coordinates
    pub fn touch_at(&mut self, pos: Vec2) {
        self.touch = Some(pos);
    }

    pub fn touch_end(&mut self) {
        self.touch = None;
    }

    /// Drop everything held (focus lost)
    pub fn release_all(&mut self) {
        self.held.clear();
        self.touch = None;
    }

    pub fn is_touching(&self) -> bool {
        self.touch.is_some()
    }

    fn any(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.held.contains(*c))
    }
}

impl InputSource for KeyState {
    fn snapshot(&self) -> TickInput {
        TickInput {
            left: self.any(&["KeyA", "ArrowLeft"]),
            right: self.any(&["KeyD", "ArrowRight"]),
            up: self.any(&["KeyW", "ArrowUp"]),
            down: self.any(&["KeyS", "ArrowDown"]),
            // Touching auto-fires
            firing: self.any(&["Space"]) || self.is_touching(),
            pointer: self.touch,
        }
    }
}
