//! Keyboard input.
//!
//! Platform-agnostic: the window runtime translates winit events into
//! [`InputEvent`]s, and the frame loop samples [`InputState`] once per iteration.

mod state;
mod types;

pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};
