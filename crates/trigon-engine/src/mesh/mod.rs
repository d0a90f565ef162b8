//! Vertex layouts and static geometry upload.

mod layout;
mod upload;

pub use layout::{AttributeDescriptor, LayoutError, VertexLayout, ELEMENT_SIZE};
pub use upload::{upload, DrawableMesh, GeometryError};
