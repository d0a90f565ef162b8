//! The built-in scene: one orange triangle on a dark teal background.

use trigon_engine::InitError;
use trigon_engine::backend::GpuBackend;
use trigon_engine::core::App;
use trigon_engine::frame::{FrameLoop, FrameLoopConfig, RenderContext};
use trigon_engine::mesh::{self, VertexLayout};
use trigon_engine::shader::{self, ShaderProgram, ShaderSource, ShaderUnit};

const VERTEX_SHADER: &str = include_str!("../shaders/triangle.vert.wgsl");
const FRAGMENT_SHADER: &str = include_str!("../shaders/triangle.frag.wgsl");

/// Positions only, three floats per vertex.
const VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

#[derive(Debug, Default)]
pub struct TriangleApp {
    config: FrameLoopConfig,
}

impl App for TriangleApp {
    fn setup<B: GpuBackend>(&mut self, ctx: &RenderContext<B>) -> Result<FrameLoop<B>, InitError> {
        let vertex = checked(shader::compile(ctx, &ShaderSource::vertex(VERTEX_SHADER)))?;
        let fragment = checked(shader::compile(ctx, &ShaderSource::fragment(FRAGMENT_SHADER)))?;

        let program = link_checked(ctx, vec![vertex, fragment])?;

        let layout = VertexLayout::packed(&[(0, 3)])?;
        let mesh = mesh::upload(ctx, &VERTICES, layout)?;

        Ok(FrameLoop::new(program, mesh, self.config.clone())?)
    }
}

fn link_checked<B: GpuBackend>(
    ctx: &RenderContext<B>,
    units: Vec<ShaderUnit<B>>,
) -> Result<ShaderProgram<B>, InitError> {
    let program = shader::link(ctx, units);
    if !program.is_linked() {
        log::error!("shader program linking failed\n{}", program.log());
        return Err(InitError::ShaderLink {
            log: program.log().to_owned(),
        });
    }
    Ok(program)
}

/// Surfaces a compile failure before anything is linked.
fn checked<B: GpuBackend>(unit: ShaderUnit<B>) -> Result<ShaderUnit<B>, InitError> {
    if unit.is_compiled() {
        return Ok(unit);
    }
    log::error!("{} shader compilation failed\n{}", unit.stage(), unit.log());
    Err(InitError::ShaderCompile {
        stage: unit.stage(),
        log: unit.log().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Once;

    use trigon_engine::backend::{Call, RecordingBackend};
    use trigon_engine::coords::ViewportState;
    use trigon_engine::frame::LoopPhase;
    use trigon_engine::input::InputState;

    use super::*;

    // ── log capture ───────────────────────────────────────────────────────

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Records every log call made on the current thread, so parallel tests
    /// only see their own records.
    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.target().to_string())));
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture;
    static INSTALL: Once = Once::new();

    fn capture_logs() {
        INSTALL.call_once(|| {
            let _ = log::set_logger(&CAPTURE);
            log::set_max_level(log::LevelFilter::Trace);
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
    }

    fn error_targets() -> Vec<String> {
        CAPTURED.with(|c| {
            c.borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Error)
                .map(|(_, target)| target.clone())
                .collect()
        })
    }

    fn context() -> (Rc<RecordingBackend>, RenderContext<RecordingBackend>) {
        let backend = Rc::new(RecordingBackend::new());
        let ctx = RenderContext::new(Rc::clone(&backend), ViewportState::new(800, 600));
        (backend, ctx)
    }

    #[test]
    fn setup_builds_a_running_loop() {
        let (backend, ctx) = context();
        let frame_loop = TriangleApp::default().setup(&ctx).unwrap();

        assert_eq!(frame_loop.phase(), LoopPhase::Running);
        assert_eq!(backend.count(|c| matches!(c, Call::CreateShader { .. })), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::CreateBuffer { bytes: 36, .. })), 1);
    }

    #[test]
    fn triangle_draws_three_vertices_until_escape() {
        let (backend, mut ctx) = context();
        let mut frame_loop = TriangleApp::default().setup(&ctx).unwrap();

        assert_eq!(frame_loop.iterate(&mut ctx, &InputState::default()), LoopPhase::Running);
        assert_eq!(
            backend.count(|c| matches!(c, Call::DrawArrays { vertex_count: 3, .. })),
            1
        );

        ctx.request_close();
        assert_eq!(frame_loop.iterate(&mut ctx, &InputState::default()), LoopPhase::Terminated);
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn broken_shader_is_reported_as_compile_failure() {
        let (backend, ctx) = context();
        let unit = shader::compile(&ctx, &ShaderSource::vertex("@vertex fn vs_main( {"));

        match checked(unit) {
            Err(InitError::ShaderCompile { log, .. }) => assert!(!log.is_empty()),
            other => panic!("expected a compile failure, got {other:?}"),
        }
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn compile_failure_is_logged_at_error_once() {
        capture_logs();
        let (_backend, ctx) = context();
        let unit = shader::compile(&ctx, &ShaderSource::vertex("@vertex fn vs_main( {"));
        assert!(checked(unit).is_err());

        let errors = error_targets();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("trigon_viewer"), "{errors:?}");
    }

    #[test]
    fn link_failure_is_logged_at_error_once() {
        capture_logs();
        let (_backend, ctx) = context();
        let vs = checked(shader::compile(&ctx, &ShaderSource::vertex(VERTEX_SHADER))).unwrap();
        // Reads a varying the vertex stage never writes.
        let fs = checked(shader::compile(
            &ctx,
            &ShaderSource::fragment(
                "@fragment fn fs_main(@location(0) c: vec3<f32>) -> @location(0) vec4<f32> { return vec4<f32>(c, 1.0); }",
            ),
        ))
        .unwrap();

        assert!(matches!(link_checked(&ctx, vec![vs, fs]), Err(InitError::ShaderLink { .. })));
        let errors = error_targets();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("trigon_viewer"), "{errors:?}");
    }
}
