use crate::backend::GpuBackend;
use crate::error::InitError;
use crate::frame::{FrameLoop, RenderContext};

/// Application contract implemented by the startup sequence.
///
/// The runtime creates the window and resolves the GPU, then calls
/// [`setup`](Self::setup) exactly once with a context whose backend is ready.
/// The returned loop is driven until it terminates.
pub trait App {
    /// Compiles, links and uploads everything the loop draws.
    ///
    /// Generic over the backend so a startup sequence can be exercised
    /// against [`RecordingBackend`](crate::backend::RecordingBackend).
    fn setup<B: GpuBackend>(&mut self, ctx: &RenderContext<B>) -> Result<FrameLoop<B>, InitError>;
}
