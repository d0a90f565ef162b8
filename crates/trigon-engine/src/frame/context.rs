use std::rc::Rc;

use crate::backend::GpuBackend;
use crate::coords::ViewportState;

/// Close request flag. Once set it is never cleared.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    pub should_close: bool,
}

/// Everything the compiler, linker, uploader and frame loop share: the
/// initialized backend, the current viewport and the close flag.
///
/// Built once the backend has resolved its device, so holding a
/// `RenderContext` means GPU calls are legal.
pub struct RenderContext<B: GpuBackend> {
    backend: Rc<B>,
    viewport: ViewportState,
    pending_resize: Option<ViewportState>,
    loop_state: LoopState,
}

impl<B: GpuBackend> RenderContext<B> {
    /// Wraps an initialized backend and applies the initial viewport.
    pub fn new(backend: Rc<B>, viewport: ViewportState) -> Self {
        backend.set_viewport(viewport);
        Self {
            backend,
            viewport,
            pending_resize: None,
            loop_state: LoopState::default(),
        }
    }

    #[inline]
    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    /// Viewport the GPU currently renders at. A delivered but not yet applied
    /// resize is not reflected here.
    #[inline]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Resize observer. Overwrites any earlier notification that the frame loop
    /// has not consumed yet.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        self.pending_resize = Some(ViewportState::new(width, height));
    }

    pub fn request_close(&mut self) {
        if !self.loop_state.should_close {
            log::debug!("close requested");
        }
        self.loop_state.should_close = true;
    }

    #[inline]
    pub fn should_close(&self) -> bool {
        self.loop_state.should_close
    }

    #[inline]
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// False while the viewport is empty and no resize is waiting, i.e. there
    /// is no target to draw into and iterating would only spin.
    pub fn needs_redraw(&self) -> bool {
        match self.pending_resize {
            Some(pending) => !pending.is_empty(),
            None => !self.viewport.is_empty(),
        }
    }

    /// Pushes a pending resize to the backend. Returns whether one was applied.
    pub(crate) fn apply_pending_resize(&mut self) -> bool {
        let Some(viewport) = self.pending_resize.take() else {
            return false;
        };
        if viewport != self.viewport {
            log::debug!("viewport {}x{}", viewport.width, viewport.height);
        }
        self.viewport = viewport;
        self.backend.set_viewport(viewport);
        true
    }
}
