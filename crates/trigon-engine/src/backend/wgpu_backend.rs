//! [`GpuBackend`] over wgpu.
//!
//! wgpu has no program or vertex-array objects. A program keeps its stage
//! modules and builds one render pipeline per vertex layout it is drawn with;
//! a vertex array is the buffer plus the attribute layout recorded for it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::coords::{ClearColor, ViewportState};
use crate::device::{Gpu, GpuFrame};
use crate::mesh::AttributeDescriptor;
use crate::shader::ShaderStage;

use super::{GpuBackend, SurfaceErrorAction};

/// Compiled stage module.
#[derive(Debug)]
pub struct WgpuShader {
    stage: ShaderStage,
    entry_point: String,
    module: wgpu::ShaderModule,
}

/// Vertex buffer layout, as recorded by `bind_vertex_buffer` and
/// `describe_attribute`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct VertexKey {
    stride: u32,
    /// `(shader location, components, byte offset)`.
    attributes: Vec<(u32, u32, u32)>,
}

#[derive(Debug, Default)]
pub struct WgpuVertexArray {
    buffer: Option<Rc<wgpu::Buffer>>,
    key: VertexKey,
}

#[derive(Debug, Default)]
pub struct WgpuProgram {
    vertex: Option<Rc<WgpuShader>>,
    fragment: Option<Rc<WgpuShader>>,
    layout: Option<wgpu::PipelineLayout>,
    pipelines: RefCell<HashMap<VertexKey, Rc<wgpu::RenderPipeline>>>,
}

impl WgpuProgram {
    fn pipeline(&self, gpu: &Gpu<'_>, key: &VertexKey) -> Option<Rc<wgpu::RenderPipeline>> {
        if let Some(pipeline) = self.pipelines.borrow().get(key) {
            return Some(Rc::clone(pipeline));
        }

        let (vs, fs, layout) = (self.vertex.as_ref()?, self.fragment.as_ref()?, self.layout.as_ref()?);

        let attributes = key
            .attributes
            .iter()
            .map(|&(location, components, offset)| {
                Some(wgpu::VertexAttribute {
                    format: vertex_format(components)?,
                    offset: u64::from(offset),
                    shader_location: location,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let pipeline = gpu.device().create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trigon pipeline"),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: &vs.module,
                entry_point: Some(vs.entry_point.as_str()),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(key.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs.module,
                entry_point: Some(fs.entry_point.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline for stride {} ({} attributes)", key.stride, attributes.len());

        let pipeline = Rc::new(pipeline);
        self.pipelines.borrow_mut().insert(key.clone(), Rc::clone(&pipeline));
        Some(pipeline)
    }
}

fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(c: ClearColor) -> Self {
        Self {
            r: f64::from(c.r),
            g: f64::from(c.g),
            b: f64::from(c.b),
            a: f64::from(c.a),
        }
    }
}

impl<'w> GpuBackend for Gpu<'w> {
    type Shader = Rc<WgpuShader>;
    type Program = WgpuProgram;
    type Buffer = Rc<wgpu::Buffer>;
    type VertexArray = WgpuVertexArray;
    type Frame = GpuFrame;

    fn create_shader(&self, stage: ShaderStage, source: &str, entry_point: &str) -> Rc<WgpuShader> {
        let module = self.device().create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trigon shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        Rc::new(WgpuShader {
            stage,
            entry_point: entry_point.to_owned(),
            module,
        })
    }

    fn delete_shader(&self, shader: Rc<WgpuShader>) {
        // A module attached to a program stays alive through the program's reference.
        drop(shader);
    }

    fn create_program(&self) -> WgpuProgram {
        WgpuProgram::default()
    }

    fn attach_shader(&self, program: &mut WgpuProgram, shader: &Rc<WgpuShader>) {
        let slot = match shader.stage {
            ShaderStage::Vertex => &mut program.vertex,
            ShaderStage::Fragment => &mut program.fragment,
        };
        *slot = Some(Rc::clone(shader));
    }

    fn link_program(&self, program: &mut WgpuProgram) -> Result<(), String> {
        if program.vertex.is_none() || program.fragment.is_none() {
            return Err("error: program needs a vertex and a fragment stage".to_owned());
        }

        program.layout = Some(self.device().create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trigon pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        }));
        program.pipelines.borrow_mut().clear();
        Ok(())
    }

    fn delete_program(&self, program: WgpuProgram) {
        drop(program);
    }

    fn create_buffer(&self, contents: &[u8]) -> Rc<wgpu::Buffer> {
        let buffer = self.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trigon vertex buffer"),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        });
        Rc::new(buffer)
    }

    fn delete_buffer(&self, buffer: Rc<wgpu::Buffer>) {
        if let Ok(buffer) = Rc::try_unwrap(buffer) {
            buffer.destroy();
        }
    }

    fn create_vertex_array(&self) -> WgpuVertexArray {
        WgpuVertexArray::default()
    }

    fn bind_vertex_buffer(&self, array: &mut WgpuVertexArray, buffer: &Rc<wgpu::Buffer>, stride: u32) {
        array.buffer = Some(Rc::clone(buffer));
        array.key.stride = stride;
    }

    fn describe_attribute(&self, array: &mut WgpuVertexArray, attribute: &AttributeDescriptor) {
        array
            .key
            .attributes
            .push((attribute.index, attribute.components, attribute.offset));
    }

    fn delete_vertex_array(&self, array: WgpuVertexArray) {
        drop(array);
    }

    fn set_viewport(&self, viewport: ViewportState) {
        self.resize(viewport);
    }

    fn begin_frame(&self, clear: ClearColor) -> Result<GpuFrame, SurfaceErrorAction> {
        if self.viewport().is_empty() {
            return Err(SurfaceErrorAction::SkipFrame);
        }

        let surface_texture = self.acquire()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("trigon frame encoder"),
            });

        // Clear pass; dropped before the encoder is moved into the frame.
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trigon clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    fn draw_arrays(
        &self,
        frame: &mut GpuFrame,
        program: &WgpuProgram,
        array: &WgpuVertexArray,
        vertex_count: u32,
    ) {
        let Some(buffer) = array.buffer.as_ref() else {
            log::error!("draw with a vertex array that has no buffer bound");
            return;
        };
        let Some(pipeline) = program.pipeline(self, &array.key) else {
            log::error!("draw with a program that is not linked");
            return;
        };

        let viewport = self.viewport();

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("trigon draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, viewport.width as f32, viewport.height as f32, 0.0, 1.0);
        rpass.set_pipeline(&pipeline);
        rpass.set_vertex_buffer(0, buffer.slice(..));
        rpass.draw(0..vertex_count, 0..1);
    }

    fn present(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue().submit(std::iter::once(encoder.finish()));
        drop(view);

        self.window().pre_present_notify();
        surface_texture.present();
    }
}
