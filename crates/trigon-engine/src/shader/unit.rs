use std::fmt;
use std::rc::Rc;

use crate::backend::GpuBackend;
use crate::frame::RenderContext;

use super::reflect::{self, StageInterface};
use super::source::{ShaderSource, ShaderStage};

/// Upper bound on a diagnostic log, in bytes.
pub const MAX_INFO_LOG_LEN: usize = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompileStatus {
    /// Created but not yet compiled.
    Pending,
    Success,
    Failed,
}

/// One compiled stage.
///
/// Owns its GPU shader object until the linker consumes it; dropping the unit
/// releases the object. A failed unit holds no GPU object, only its log.
pub struct ShaderUnit<B: GpuBackend> {
    backend: Rc<B>,
    handle: Option<B::Shader>,
    stage: ShaderStage,
    status: CompileStatus,
    log: String,
    interface: Option<StageInterface>,
}

impl<B: GpuBackend> ShaderUnit<B> {
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn status(&self) -> CompileStatus {
        self.status
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.status == CompileStatus::Success
    }

    /// Diagnostic text; empty unless compilation failed.
    #[inline]
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.interface.as_ref().map(|iface| iface.entry_point.as_str())
    }

    pub(crate) fn handle(&self) -> Option<&B::Shader> {
        self.handle.as_ref()
    }

    pub(crate) fn interface(&self) -> Option<&StageInterface> {
        self.interface.as_ref()
    }
}

impl<B: GpuBackend> Drop for ShaderUnit<B> {
    fn drop(&mut self) {
        if let Some(shader) = self.handle.take() {
            log::trace!("releasing {} shader", self.stage);
            self.backend.delete_shader(shader);
        }
    }
}

impl<B: GpuBackend> fmt::Debug for ShaderUnit<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderUnit")
            .field("stage", &self.stage)
            .field("status", &self.status)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Compiles one stage.
///
/// Never fails outright: a unit that did not compile comes back with
/// `CompileStatus::Failed` and its diagnostics in [`ShaderUnit::log`]. Callers
/// must check the status before handing units to [`link`](super::link).
pub fn compile<B: GpuBackend>(ctx: &RenderContext<B>, source: &ShaderSource) -> ShaderUnit<B> {
    let mut unit = ShaderUnit {
        backend: Rc::clone(ctx.backend()),
        handle: None,
        stage: source.stage(),
        status: CompileStatus::Pending,
        log: String::new(),
        interface: None,
    };

    match reflect::front_end(source) {
        Ok(iface) => {
            let shader = ctx
                .backend()
                .create_shader(source.stage(), source.text(), &iface.entry_point);
            log::debug!("compiled {} shader `{}`", unit.stage, iface.entry_point);
            unit.handle = Some(shader);
            unit.interface = Some(iface);
            unit.status = CompileStatus::Success;
        }
        Err(diagnostic) => {
            log::debug!("{} shader compilation failed", unit.stage);
            unit.log = bound_log(diagnostic);
            unit.status = CompileStatus::Failed;
        }
    }

    unit
}

/// Truncates `log` to [`MAX_INFO_LOG_LEN`] bytes on a char boundary.
pub(crate) fn bound_log(mut log: String) -> String {
    if log.len() > MAX_INFO_LOG_LEN {
        let mut cut = MAX_INFO_LOG_LEN;
        while !log.is_char_boundary(cut) {
            cut -= 1;
        }
        log.truncate(cut);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Call;
    use crate::fixtures;

    #[test]
    fn valid_vertex_source_compiles() {
        let (backend, ctx) = fixtures::context();
        let unit = compile(&ctx, &ShaderSource::vertex(fixtures::TRIANGLE_VS));

        assert_eq!(unit.status(), CompileStatus::Success);
        assert!(unit.log().is_empty());
        assert_eq!(unit.entry_point(), Some("vs_main"));
        assert_eq!(
            backend.count(|c| matches!(c, Call::CreateShader { stage: ShaderStage::Vertex, .. })),
            1
        );
    }

    #[test]
    fn syntax_error_fails_with_log() {
        let (backend, ctx) = fixtures::context();
        let unit = compile(&ctx, &ShaderSource::vertex(fixtures::BROKEN_VS));

        assert_eq!(unit.status(), CompileStatus::Failed);
        assert!(!unit.log().is_empty());
        assert!(unit.handle().is_none());
        assert_eq!(backend.count(Call::is_create), 0);
    }

    #[test]
    fn validation_error_fails_with_log() {
        let (_backend, ctx) = fixtures::context();
        let unit = compile(&ctx, &ShaderSource::vertex(fixtures::MISTYPED_VS));

        assert_eq!(unit.status(), CompileStatus::Failed);
        assert!(!unit.log().is_empty());
    }

    #[test]
    fn source_for_the_wrong_stage_fails() {
        let (_backend, ctx) = fixtures::context();
        let unit = compile(&ctx, &ShaderSource::fragment(fixtures::TRIANGLE_VS));

        assert_eq!(unit.status(), CompileStatus::Failed);
        assert!(unit.log().contains("@fragment"), "{}", unit.log());
    }

    #[test]
    fn dropping_a_compiled_unit_releases_it_once() {
        let (backend, ctx) = fixtures::context();
        let unit = compile(&ctx, &ShaderSource::fragment(fixtures::TRIANGLE_FS));
        let id = *unit.handle().unwrap();
        drop(unit);

        assert_eq!(backend.count(|c| *c == Call::DeleteShader(id)), 1);
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn long_logs_are_truncated_on_char_boundary() {
        let log = "é".repeat(MAX_INFO_LOG_LEN);
        let bounded = bound_log(log);
        assert!(bounded.len() <= MAX_INFO_LOG_LEN);
        assert!(bounded.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_logs_are_untouched() {
        assert_eq!(bound_log("error: oops".to_owned()), "error: oops");
    }
}
