//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, resolves the GPU for it
//! and drives the application's frame loop from `RedrawRequested`.

mod runtime;
mod translate;

pub use runtime::{Runtime, RuntimeConfig};
