//! Input: explicit event records from the windowing layer, mapped to actions.
//!
//! # Invariants
//! - Events are consumed on the frame thread, once per frame, in arrival order.
//! - The first pointer sample after (re)activation never produces a look delta.
//! - Overlay toggling is edge-triggered on key press.

pub mod action;
pub mod state;

pub use action::{Action, InputEvent, Key, MoveDirection};
pub use state::{InputState, MouseTracker};

pub fn crate_info() -> &'static str {
    concat!("skyisle-input v", env!("CARGO_PKG_VERSION"))
}
