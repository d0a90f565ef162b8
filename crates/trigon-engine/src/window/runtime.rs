use std::rc::Rc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::App;
use crate::device::{Gpu, GpuInit, GpuSurface};
use crate::error::InitError;
use crate::frame::{FrameLoop, LoopPhase, RenderContext};
use crate::input::InputState;

use super::translate::translate_input_event;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Requested framebuffer size in physical pixels.
    pub initial_size: PhysicalSize<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "graphics-engine".to_string(),
            initial_size: PhysicalSize::new(800, 600),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, hands the resolved GPU to `app`, and drives the
    /// returned frame loop until it terminates.
    ///
    /// Returns an error if initialization failed; a clean close is `Ok`.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// GPU-side state of the window. Borrows the window through `Gpu<'w>`.
struct Session<'w> {
    frame_loop: FrameLoop<Gpu<'w>>,
    ctx: RenderContext<Gpu<'w>>,
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    session: Session<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    started: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            started: false,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<(), InitError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop.create_window(attrs)?;

        let gpu_init = self.gpu_init.clone();
        let app = &mut self.app;

        let built: Result<WindowEntry, InitError> = WindowEntryTryBuilder {
            input_state: InputState::default(),
            window,
            session_builder: |w| {
                let gpu = pollster::block_on(GpuSurface::create(w)?.resolve(gpu_init))?;
                let viewport = gpu.viewport();
                let ctx = RenderContext::new(Rc::new(gpu), viewport);
                let frame_loop = app.setup(&ctx)?;
                Ok(Session { frame_loop, ctx })
            },
        }
        .try_build();
        let entry = built?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: InitError) {
        log::error!("initialization failed: {err}");
        self.failure = Some(anyhow::Error::new(err).context("initialization failed"));
        event_loop.exit();
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // The window and its GPU state are created once and kept across
        // suspend/resume.
        if self.started {
            return;
        }
        self.started = true;

        if let Err(err) = self.create_window_entry(event_loop) {
            self.fail(event_loop, err);
            return;
        }
        log::info!("window open; entering frame loop");
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw while there is something to draw into. A minimized
        // window waits for the resize that restores it.
        if let Some(entry) = &self.entry {
            if entry.with_session(|s| s.ctx.needs_redraw()) {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if let Some(ev) = translate_input_event(&event) {
            entry.with_mut(|fields| fields.input_state.apply_event(ev));
        }

        match event {
            WindowEvent::CloseRequested => {
                // The frame loop observes the close on its next iteration.
                entry.with_session_mut(|s| s.ctx.request_close());
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::Resized(size) => {
                entry.with_session_mut(|s| s.ctx.notify_resize(size.width, size.height));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_session_mut(|s| s.ctx.notify_resize(size.width, size.height));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let phase = entry.with_mut(|fields| {
                    let Session { frame_loop, ctx } = &mut *fields.session;
                    frame_loop.iterate(ctx, fields.input_state)
                });

                if phase == LoopPhase::Terminated {
                    // Resources are already released; this destroys the surface
                    // and then the window.
                    self.entry = None;
                    log::info!("window closed");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
