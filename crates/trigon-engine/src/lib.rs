//! Trigon engine crate.
//!
//! Builds a shader program, uploads static geometry and drives a single-window
//! draw loop on top of wgpu + winit. GPU calls go through [`backend::GpuBackend`],
//! so everything above the device layer can run against the recording backend.

pub mod backend;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod frame;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod shader;
pub mod time;
pub mod window;

#[cfg(test)]
mod fixtures;

pub use error::InitError;
