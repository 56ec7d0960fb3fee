use crate::action::{Action, InputEvent, Key, MoveDirection};
use std::collections::HashSet;

/// Turns absolute pointer samples into look deltas.
///
/// The first sample after construction or [`MouseTracker::reset`] only
/// establishes the reference point and yields a zero delta.
#[derive(Debug, Clone, Default)]
pub struct MouseTracker {
    last: Option<(f64, f64)>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample and return `(dx, dy)` with dy positive upward.
    pub fn sample(&mut self, x: f64, y: f64) -> (f32, f32) {
        let (last_x, last_y) = self.last.unwrap_or((x, y));
        self.last = Some((x, y));
        ((x - last_x) as f32, (last_y - y) as f32)
    }

    /// Forget the reference point; the next sample is a first sample again.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn has_reference(&self) -> bool {
        self.last.is_some()
    }
}

/// Per-frame input state: held keys plus the pointer tracker.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    mouse: MouseTracker,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one event, updating held keys and returning the action it
    /// triggers, if any.
    pub fn handle(&mut self, event: InputEvent) -> Option<Action> {
        match event {
            InputEvent::Key { key, pressed } => self.handle_key(key, pressed),
            InputEvent::PointerMoved { x, y } => {
                // The reference point moves even when look is suppressed.
                let (dx, dy) = self.mouse.sample(x, y);
                if self.is_held(Key::LeftControl) {
                    return None;
                }
                if dx == 0.0 && dy == 0.0 {
                    return None;
                }
                Some(Action::Look { dx, dy })
            }
            InputEvent::Scroll { dy } => Some(Action::Zoom(dy)),
            InputEvent::FocusLost => {
                self.release_all();
                None
            }
            InputEvent::CloseRequested => Some(Action::Quit),
        }
    }

    fn handle_key(&mut self, key: Key, pressed: bool) -> Option<Action> {
        if !pressed {
            self.held.remove(&key);
            return None;
        }
        let newly_pressed = self.held.insert(key);
        match key {
            Key::Escape => Some(Action::Quit),
            Key::F1 if newly_pressed => {
                tracing::debug!("overlay toggle requested");
                Some(Action::ToggleOverlay)
            }
            _ => None,
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Movement directions whose keys are currently held, in a fixed order.
    pub fn held_directions(&self) -> impl Iterator<Item = MoveDirection> + '_ {
        MoveDirection::ALL
            .into_iter()
            .filter(|d| self.held.contains(&d.key()))
    }

    /// Drop the pointer reference, e.g. when cursor capture changes.
    pub fn reset_pointer(&mut self) {
        self.mouse.reset();
    }

    /// Release every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }
}
