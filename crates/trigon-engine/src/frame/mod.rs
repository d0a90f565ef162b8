//! Render context and the per-frame state machine.

mod context;
mod frame_loop;

pub use context::{LoopState, RenderContext};
pub use frame_loop::{FrameLoop, FrameLoopConfig, FrameLoopError, LoopPhase};
