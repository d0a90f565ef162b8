use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::backend::{GpuBackend, SurfaceErrorAction};
use crate::coords::ClearColor;
use crate::input::{InputState, Key};
use crate::mesh::DrawableMesh;
use crate::shader::ShaderProgram;
use crate::time::FrameClock;

use super::RenderContext;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopPhase {
    Running,
    /// Close observed; resources are being released.
    Closing,
    /// Resources released. Further iterations do nothing.
    Terminated,
}

#[derive(Debug, Clone)]
pub struct FrameLoopConfig {
    /// Color every frame is cleared to before drawing.
    pub clear_color: ClearColor,
    /// Key that requests close while held.
    pub close_key: Key,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            clear_color: ClearColor::slate(),
            close_key: Key::Escape,
        }
    }
}

/// The mesh cannot feed the program it is paired with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameLoopError {
    #[error("vertex input at location {location} has no attribute in the mesh layout")]
    MissingVertexInput { location: u32 },
    #[error("vertex input at location {location} reads {expected} components, the mesh supplies {actual}")]
    ComponentMismatch {
        location: u32,
        expected: u32,
        actual: u32,
    },
}

/// Per-frame state machine: sample input, apply resize, clear, draw, present.
///
/// Owns the program and the mesh for the lifetime of the loop and releases
/// both, mesh first, when it terminates.
pub struct FrameLoop<B: GpuBackend> {
    mesh: Option<DrawableMesh<B>>,
    program: Option<ShaderProgram<B>>,
    phase: LoopPhase,
    config: FrameLoopConfig,
    clock: FrameClock,
}

impl<B: GpuBackend> FrameLoop<B> {
    /// # Panics
    ///
    /// If `program` did not link. Drawing with an unlinked program is a
    /// caller bug, not a recoverable condition.
    pub fn new(
        program: ShaderProgram<B>,
        mesh: DrawableMesh<B>,
        config: FrameLoopConfig,
    ) -> Result<Self, FrameLoopError> {
        assert!(
            program.is_linked(),
            "frame loop needs a linked shader program (status {:?})",
            program.status()
        );

        for input in program.vertex_inputs() {
            let Some(attribute) = mesh.layout().attribute(input.location) else {
                return Err(FrameLoopError::MissingVertexInput { location: input.location });
            };
            if attribute.components != input.components {
                return Err(FrameLoopError::ComponentMismatch {
                    location: input.location,
                    expected: input.components,
                    actual: attribute.components,
                });
            }
        }

        Ok(Self {
            mesh: Some(mesh),
            program: Some(program),
            phase: LoopPhase::Running,
            config,
            clock: FrameClock::new(),
        })
    }

    #[inline]
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    #[inline]
    pub fn config(&self) -> &FrameLoopConfig {
        &self.config
    }

    /// Frames that reached `present`.
    #[inline]
    pub fn frames_presented(&self) -> u64 {
        self.clock.ticks()
    }

    /// Runs one iteration and returns the phase after it.
    ///
    /// A close observed during the iteration (close key, external request or a
    /// fatal surface error) tears the loop down before returning, so the result
    /// is then `Terminated`.
    pub fn iterate(&mut self, ctx: &mut RenderContext<B>, input: &InputState) -> LoopPhase {
        match self.phase {
            LoopPhase::Terminated => return LoopPhase::Terminated,
            LoopPhase::Closing => {
                self.teardown();
                return self.phase;
            }
            LoopPhase::Running => {}
        }

        if input.key_down(self.config.close_key) {
            log::debug!("{} pressed", self.config.close_key);
            ctx.request_close();
        }

        ctx.apply_pending_resize();

        self.render_frame(ctx);

        if ctx.should_close() {
            self.phase = LoopPhase::Closing;
            self.teardown();
        }

        self.phase
    }

    /// Releases the mesh, then the program. Idempotent.
    pub fn teardown(&mut self) {
        if self.phase == LoopPhase::Terminated {
            return;
        }
        self.phase = LoopPhase::Closing;

        drop(self.mesh.take());
        drop(self.program.take());

        self.phase = LoopPhase::Terminated;
        log::info!("frame loop terminated after {} frames", self.clock.ticks());
    }

    fn render_frame(&mut self, ctx: &mut RenderContext<B>) {
        let backend = Rc::clone(ctx.backend());

        let mut frame = match backend.begin_frame(self.config.clear_color) {
            Ok(frame) => frame,
            Err(SurfaceErrorAction::Fatal) => {
                log::error!("surface is unrecoverable; closing");
                ctx.request_close();
                return;
            }
            Err(SurfaceErrorAction::Reconfigured) => {
                log::warn!("surface reconfigured; skipping frame");
                return;
            }
            Err(SurfaceErrorAction::SkipFrame) => {
                log::debug!("no target available; skipping frame");
                return;
            }
        };

        if let (Some(program), Some(mesh)) = (&self.program, &self.mesh) {
            if let (Some(p), Some(array)) = (program.handle(), mesh.array()) {
                backend.draw_arrays(&mut frame, p, array, mesh.vertex_count());
            }
        }

        backend.present(frame);

        let time = self.clock.tick();
        log::trace!("frame {} presented (dt {:.4}s)", time.frame_index, time.dt);
    }
}

impl<B: GpuBackend> Drop for FrameLoop<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<B: GpuBackend> fmt::Debug for FrameLoop<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("phase", &self.phase)
            .field("config", &self.config)
            .field("frames_presented", &self.clock.ticks())
            .finish_non_exhaustive()
    }
}
