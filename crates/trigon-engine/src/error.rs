use thiserror::Error;

use crate::frame::FrameLoopError;
use crate::mesh::{GeometryError, LayoutError};
use crate::shader::ShaderStage;

/// Startup failure. Any of these ends the process before the first frame.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create window")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("failed to create wgpu surface")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("window has zero size")]
    ZeroSizedWindow,

    #[error("failed to find a suitable GPU adapter")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create wgpu device/queue")]
    NoDevice(#[from] wgpu::RequestDeviceError),

    #[error("no supported surface formats")]
    NoSurfaceFormat,

    #[error("{stage} shader compilation failed:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program linking failed:\n{log}")]
    ShaderLink { log: String },

    #[error("invalid vertex layout")]
    Layout(#[from] LayoutError),

    #[error("invalid geometry")]
    Geometry(#[from] GeometryError),

    #[error("mesh does not match the shader program")]
    FrameLoop(#[from] FrameLoopError),
}
