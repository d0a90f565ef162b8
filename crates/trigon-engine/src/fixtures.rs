//! Shared test sources and setup.

use std::rc::Rc;

use crate::backend::RecordingBackend;
use crate::coords::ViewportState;
use crate::frame::RenderContext;
use crate::mesh::{self, DrawableMesh, VertexLayout};
use crate::shader::{self, ShaderProgram, ShaderSource};

pub const TRIANGLE_VS: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 1.0);
}
"#;

pub const TRIANGLE_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.2, 1.0);
}
"#;

/// Two vertex inputs, one varying at location 0.
pub const VARYING_VS: &str = r#"
struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) a_pos: vec3<f32>, @location(1) a_color: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(a_pos, 1.0);
    out.color = a_color;
    return out;
}
"#;

pub const VARYING_FS: &str = r#"
@fragment
fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
"#;

pub const BROKEN_VS: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<f32> -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 1.0)
}
"#;

/// Parses, but returns a `vec3` where a `vec4` is declared.
pub const MISTYPED_VS: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return a_pos;
}
"#;

pub const UINT_INPUT_VS: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<u32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec3<f32>(a_pos), 1.0);
}
"#;

pub const UINT_OUTPUT_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<u32> {
    return vec4<u32>(1u);
}
"#;

pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

pub fn context() -> (Rc<RecordingBackend>, RenderContext<RecordingBackend>) {
    let backend = Rc::new(RecordingBackend::new());
    let ctx = RenderContext::new(Rc::clone(&backend), ViewportState::new(800, 600));
    (backend, ctx)
}

pub fn program(ctx: &RenderContext<RecordingBackend>, vs: &str, fs: &str) -> ShaderProgram<RecordingBackend> {
    let units = vec![
        shader::compile(ctx, &ShaderSource::vertex(vs)),
        shader::compile(ctx, &ShaderSource::fragment(fs)),
    ];
    shader::link(ctx, units)
}

pub fn triangle_program(ctx: &RenderContext<RecordingBackend>) -> ShaderProgram<RecordingBackend> {
    program(ctx, TRIANGLE_VS, TRIANGLE_FS)
}

pub fn triangle_mesh(ctx: &RenderContext<RecordingBackend>) -> DrawableMesh<RecordingBackend> {
    let layout = VertexLayout::packed(&[(0, 3)]).unwrap();
    mesh::upload(ctx, &TRIANGLE_VERTICES, layout).unwrap()
}
