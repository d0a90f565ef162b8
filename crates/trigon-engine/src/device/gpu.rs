use std::cell::{Cell, RefCell};

use winit::window::Window;

use crate::backend::SurfaceErrorAction;
use crate::coords::ViewportState;
use crate::error::InitError;

use super::{surface, GpuInit};

/// A window with a wgpu surface but no device yet.
///
/// GPU calls are not legal until [`resolve`](Self::resolve) succeeds.
pub struct GpuSurface<'w> {
    window: &'w Window,
    instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
}

impl<'w> GpuSurface<'w> {
    /// Creates the wgpu instance and binds a surface to `window`.
    pub fn create(window: &'w Window) -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surface lifetime is tied to `window` via `'w`.
        let surface = instance.create_surface(window)?;

        Ok(Self {
            window,
            instance,
            surface,
        })
    }

    /// Requests an adapter and device compatible with the surface, then
    /// configures the surface at the window's current size.
    pub async fn resolve(self, init: GpuInit) -> Result<Gpu<'w>, InitError> {
        let Self {
            window,
            instance,
            surface,
        } = self;

        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(InitError::ZeroSizedWindow);
        }

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("trigon device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format =
            surface::choose_surface_format(&caps.formats, prefer_srgb).ok_or(InitError::NoSurfaceFormat)?;
        let alpha_mode = surface::choose_alpha_mode(&caps.alpha_modes, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);
        log::debug!("surface configured: {format:?} {}x{}", size.width, size.height);

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config: RefCell::new(config),
            viewport: Cell::new(ViewportState::from(size)),
        })
    }
}

/// Initialized wgpu context bound to one window.
///
/// Implements [`GpuBackend`](crate::backend::GpuBackend). Shared as `Rc<Gpu>`
/// by the render context and every resource, so methods take `&self`.
pub struct Gpu<'w> {
    /// Needed for `pre_present_notify`.
    window: &'w Window,

    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: RefCell<wgpu::SurfaceConfiguration>,

    /// Last viewport applied. May be empty while the configuration keeps the
    /// last non-empty size.
    viewport: Cell<ViewportState>,
}

/// One acquired frame. Consumed by `present`.
///
/// Holding the surface texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl<'w> Gpu<'w> {
    pub fn window(&self) -> &'w Window {
        self.window
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.borrow().format
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.get()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface for `viewport`; deferred while it is empty.
    pub fn resize(&self, viewport: ViewportState) {
        self.viewport.set(viewport);
        surface::apply_resize(&self.surface, &self.device, &mut self.config.borrow_mut(), viewport);
    }

    /// Acquires the next surface texture, mapping failures to an action.
    pub fn acquire(&self) -> Result<wgpu::SurfaceTexture, SurfaceErrorAction> {
        self.surface
            .get_current_texture()
            .map_err(|err| self.handle_surface_error(err))
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring
    /// the surface when that is the remedy.
    pub fn handle_surface_error(&self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        log::debug!("surface error: {err}");
        surface::map_surface_error(
            &self.surface,
            &self.device,
            &self.config.borrow(),
            self.viewport.get(),
            err,
        )
    }
}
