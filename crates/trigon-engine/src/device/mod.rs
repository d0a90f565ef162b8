//! wgpu device + surface management.
//!
//! Creating the surface and resolving an adapter/device is the initialization
//! barrier: no shader, buffer or draw call is legal before
//! [`GpuSurface::resolve`] has produced a [`Gpu`].

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame, GpuSurface};
pub use init::GpuInit;
