/// Keys the viewer reacts to. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Escape,
    F1,
    LeftControl,
    Other,
}

/// Camera translation direction, relative to the camera basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveDirection {
    pub const ALL: [MoveDirection; 4] = [
        MoveDirection::Forward,
        MoveDirection::Backward,
        MoveDirection::Left,
        MoveDirection::Right,
    ];

    /// Key bound to this direction.
    pub fn key(self) -> Key {
        match self {
            MoveDirection::Forward => Key::W,
            MoveDirection::Backward => Key::S,
            MoveDirection::Left => Key::A,
            MoveDirection::Right => Key::D,
        }
    }
}

/// A raw input record produced by the windowing layer.
///
/// Records are queued as they arrive and drained once per frame, so the
/// consumer sees them in arrival order on the frame thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key transition. Repeats arrive as `pressed: true` while already held.
    Key { key: Key, pressed: bool },
    /// Absolute pointer position in window pixels (Y grows downward).
    PointerMoved { x: f64, y: f64 },
    /// Vertical scroll in lines; positive scrolls away from the user.
    Scroll { dy: f32 },
    /// The window lost keyboard focus; every held key counts as released.
    FocusLost,
    /// The window asked to close.
    CloseRequested,
}

/// A high-level action derived from input.
///
/// The viewer state consumes actions, never raw events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Look delta in pixels, Y already flipped so positive looks up.
    Look { dx: f32, dy: f32 },
    /// Scroll amount applied to the field of view.
    Zoom(f32),
    /// Toggle the debug overlay and cursor capture.
    ToggleOverlay,
    /// Leave the frame loop.
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_map_to_wasd() {
        let keys: Vec<Key> = MoveDirection::ALL.iter().map(|d| d.key()).collect();
        assert_eq!(keys, vec![Key::W, Key::S, Key::A, Key::D]);
    }

    #[test]
    fn look_action_is_constructible() {
        let a = Action::Look { dx: 1.0, dy: -2.0 };
        assert!(matches!(a, Action::Look { .. }));
    }
}
