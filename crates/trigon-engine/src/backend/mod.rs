//! GPU backend abstraction.
//!
//! [`GpuBackend`] is the narrow command surface the shader pipeline, the
//! geometry uploader and the frame loop are written against. Handles are
//! associated types owned by the caller; every `create_*` is paired with exactly
//! one `delete_*`, which the owning wrappers guarantee through `Drop`.
//!
//! # Backends
//!
//! - [`Gpu`](crate::device::Gpu) (`wgpu_backend`): renders through wgpu.
//! - [`RecordingBackend`]: allocates integer handles and logs every call; used to
//!   exercise the loop without a GPU.

mod recording;
mod wgpu_backend;

pub use recording::{Call, RecordingBackend};
pub use wgpu_backend::{WgpuProgram, WgpuShader, WgpuVertexArray};

use crate::coords::{ClearColor, ViewportState};
use crate::mesh::AttributeDescriptor;
use crate::shader::ShaderStage;

/// Response to a failed attempt to start a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was reconfigured; the next frame may succeed.
    Reconfigured,
    /// Nothing to draw into right now (timeout, zero-sized target).
    SkipFrame,
    /// Unrecoverable, commonly out of memory.
    Fatal,
}

/// Command surface of a GPU context that has already been initialized.
///
/// Methods take `&self`: a backend is shared as `Rc<B>` between the render
/// context and every resource wrapper, all on the thread that created it.
pub trait GpuBackend {
    type Shader;
    type Program;
    type Buffer;
    type VertexArray;
    type Frame;

    /// Creates a shader object from source that has already passed the front end.
    fn create_shader(&self, stage: ShaderStage, source: &str, entry_point: &str) -> Self::Shader;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Self::Program;
    fn attach_shader(&self, program: &mut Self::Program, shader: &Self::Shader);
    /// Links the attached stages. The error is the diagnostic log.
    fn link_program(&self, program: &mut Self::Program) -> Result<(), String>;
    fn delete_program(&self, program: Self::Program);

    /// Uploads `contents` into a write-once vertex buffer.
    fn create_buffer(&self, contents: &[u8]) -> Self::Buffer;
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Self::VertexArray;
    /// Makes `buffer` the vertex source of `array`, with `stride` bytes per vertex.
    fn bind_vertex_buffer(&self, array: &mut Self::VertexArray, buffer: &Self::Buffer, stride: u32);
    /// Records one attribute of the bound buffer in `array` and enables its slot.
    fn describe_attribute(&self, array: &mut Self::VertexArray, attribute: &AttributeDescriptor);
    fn delete_vertex_array(&self, array: Self::VertexArray);

    /// Applies a new viewport; the next frame renders at this size.
    fn set_viewport(&self, viewport: ViewportState);

    /// Acquires the next target and clears its color to `clear`.
    fn begin_frame(&self, clear: ClearColor) -> Result<Self::Frame, SurfaceErrorAction>;

    /// Binds `program` then `array` and draws `vertex_count` vertices as a
    /// triangle list.
    fn draw_arrays(
        &self,
        frame: &mut Self::Frame,
        program: &Self::Program,
        array: &Self::VertexArray,
        vertex_count: u32,
    );

    /// Submits the frame and hands it to the presentation engine. May block on
    /// vsync.
    fn present(&self, frame: Self::Frame);
}
