use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::backend::GpuBackend;
use crate::frame::RenderContext;

use super::layout::VertexLayout;

/// Vertex data that cannot be drawn with the given layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("no vertex data")]
    Empty,
    /// `per_vertex` is the layout stride in elements, which includes any
    /// padding, not the summed component count.
    #[error("{len} floats do not divide into vertices of {per_vertex} elements (the layout stride)")]
    NotDivisible { len: usize, per_vertex: u32 },
    #[error("{vertices} vertices do not form whole triangles")]
    IncompleteTriangle { vertices: usize },
    #[error("{vertices} vertices exceed the draw call limit")]
    TooLarge { vertices: usize },
}

/// Uploaded, draw-ready geometry: one vertex array bound to one static
/// vertex buffer.
///
/// Immutable after upload. Dropping it releases the array, then the buffer.
pub struct DrawableMesh<B: GpuBackend> {
    backend: Rc<B>,
    array: Option<B::VertexArray>,
    buffer: Option<B::Buffer>,
    vertex_count: u32,
    layout: VertexLayout,
}

impl<B: GpuBackend> DrawableMesh<B> {
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub(crate) fn array(&self) -> Option<&B::VertexArray> {
        self.array.as_ref()
    }
}

impl<B: GpuBackend> Drop for DrawableMesh<B> {
    fn drop(&mut self) {
        if let Some(array) = self.array.take() {
            self.backend.delete_vertex_array(array);
        }
        if let Some(buffer) = self.buffer.take() {
            self.backend.delete_buffer(buffer);
        }
        log::debug!("released mesh ({} vertices)", self.vertex_count);
    }
}

impl<B: GpuBackend> fmt::Debug for DrawableMesh<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawableMesh")
            .field("vertex_count", &self.vertex_count)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Uploads `vertices` once into a static buffer described by `layout`.
///
/// The data is validated before anything is allocated, so a rejected upload
/// makes no backend calls.
pub fn upload<B: GpuBackend>(
    ctx: &RenderContext<B>,
    vertices: &[f32],
    layout: VertexLayout,
) -> Result<DrawableMesh<B>, GeometryError> {
    let vertex_count = vertex_count(vertices.len(), &layout)?;
    let backend = Rc::clone(ctx.backend());

    let mut array = backend.create_vertex_array();
    let buffer = backend.create_buffer(bytemuck::cast_slice(vertices));

    backend.bind_vertex_buffer(&mut array, &buffer, layout.stride());
    for attribute in layout.attributes() {
        backend.describe_attribute(&mut array, attribute);
    }

    log::debug!(
        "uploaded {vertex_count} vertices ({} bytes, stride {})",
        std::mem::size_of_val(vertices),
        layout.stride()
    );

    Ok(DrawableMesh {
        backend,
        array: Some(array),
        buffer: Some(buffer),
        vertex_count,
        layout,
    })
}

fn vertex_count(len: usize, layout: &VertexLayout) -> Result<u32, GeometryError> {
    if len == 0 {
        return Err(GeometryError::Empty);
    }

    let per_vertex = layout.components_per_vertex();
    if len % per_vertex as usize != 0 {
        return Err(GeometryError::NotDivisible { len, per_vertex });
    }

    let vertices = len / per_vertex as usize;
    if vertices % 3 != 0 {
        return Err(GeometryError::IncompleteTriangle { vertices });
    }

    u32::try_from(vertices).map_err(|_| GeometryError::TooLarge { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Call;
    use crate::fixtures;
    use crate::mesh::AttributeDescriptor;

    #[test]
    fn triangle_uploads_three_vertices() {
        let (backend, ctx) = fixtures::context();
        backend.clear_calls();
        let layout = VertexLayout::new(vec![AttributeDescriptor::new(0, 3, 12, 0)]).unwrap();
        let mesh = upload(&ctx, &fixtures::TRIANGLE_VERTICES, layout).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(
            backend.calls(),
            vec![
                Call::CreateVertexArray(1),
                Call::CreateBuffer { buffer: 2, bytes: 36 },
                Call::BindVertexBuffer { array: 1, buffer: 2, stride: 12 },
                Call::DescribeAttribute {
                    array: 1,
                    attribute: AttributeDescriptor::new(0, 3, 12, 0),
                },
            ]
        );
    }

    #[test]
    fn attributes_are_described_in_layout_order() {
        let (backend, ctx) = fixtures::context();
        let layout = VertexLayout::packed(&[(1, 3), (0, 3)]).unwrap();
        let vertices = [0.0f32; 18];
        let mesh = upload(&ctx, &vertices, layout).unwrap();

        let described: Vec<u32> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::DescribeAttribute { attribute, .. } => Some(attribute.index),
                _ => None,
            })
            .collect();
        assert_eq!(described, vec![1, 0]);
        assert_eq!(mesh.vertex_count(), 3);
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn remainder_is_rejected_before_any_gpu_call() {
        let (backend, ctx) = fixtures::context();
        backend.clear_calls();
        let layout = VertexLayout::packed(&[(0, 3)]).unwrap();

        let err = upload(&ctx, &[0.0f32; 10], layout).unwrap_err();
        assert_eq!(err, GeometryError::NotDivisible { len: 10, per_vertex: 3 });
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn padded_stride_counts_padding_per_vertex() {
        let (backend, ctx) = fixtures::context();
        backend.clear_calls();
        // Three components in a 16-byte stride: four floats per vertex.
        let layout = VertexLayout::new(vec![AttributeDescriptor::new(0, 3, 16, 0)]).unwrap();

        let err = upload(&ctx, &fixtures::TRIANGLE_VERTICES, layout.clone()).unwrap_err();
        assert_eq!(err, GeometryError::NotDivisible { len: 9, per_vertex: 4 });
        assert!(err.to_string().contains("stride"), "{err}");
        assert!(backend.calls().is_empty());

        let mesh = upload(&ctx, &[0.0f32; 12], layout).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn empty_data_is_rejected() {
        let (_backend, ctx) = fixtures::context();
        let layout = VertexLayout::packed(&[(0, 3)]).unwrap();
        assert_eq!(upload(&ctx, &[], layout).unwrap_err(), GeometryError::Empty);
    }

    #[test]
    fn partial_triangle_is_rejected() {
        let (_backend, ctx) = fixtures::context();
        let layout = VertexLayout::packed(&[(0, 3)]).unwrap();
        assert_eq!(
            upload(&ctx, &[0.0f32; 12], layout).unwrap_err(),
            GeometryError::IncompleteTriangle { vertices: 4 }
        );
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn drop_releases_array_then_buffer_once() {
        let (backend, ctx) = fixtures::context();
        let mesh = fixtures::triangle_mesh(&ctx);
        backend.clear_calls();
        drop(mesh);

        assert_eq!(backend.calls(), vec![Call::DeleteVertexArray(1), Call::DeleteBuffer(2)]);
    }
}
