use thiserror::Error;

/// Size in bytes of one vertex component (`f32`).
pub const ELEMENT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// Where one vertex attribute lives inside the interleaved vertex buffer.
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    pub index: u32,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

impl AttributeDescriptor {
    #[inline]
    pub const fn new(index: u32, components: u32, stride: u32, offset: u32) -> Self {
        Self {
            index,
            components,
            stride,
            offset,
        }
    }

    /// Bytes this attribute occupies in a vertex.
    #[inline]
    pub const fn size(&self) -> u32 {
        self.components * ELEMENT_SIZE
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("vertex layout has no attributes")]
    Empty,
    #[error("attribute {index} has {components} components (expected 1 to 4)")]
    ComponentCount { index: u32, components: u32 },
    #[error("attribute index {index} appears more than once")]
    DuplicateIndex { index: u32 },
    #[error("attribute {index} has stride {stride}, other attributes use {expected}")]
    StrideMismatch { index: u32, stride: u32, expected: u32 },
    #[error("attribute {index} ends at byte {end}, past the {stride}-byte stride")]
    AttributeOverflow { index: u32, end: u32, stride: u32 },
    #[error("attribute {index} stride and offset must be multiples of 4 bytes")]
    Misaligned { index: u32 },
    #[error("attributes need {bytes} bytes per vertex but the stride is {stride}")]
    ExceedsStride { bytes: u32, stride: u32 },
}

/// Validated description of one interleaved `f32` vertex buffer.
///
/// All descriptors share a stride, each fits inside it, and together they
/// need no more than `stride` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<AttributeDescriptor>,
    stride: u32,
}

impl VertexLayout {
    pub fn new(attributes: Vec<AttributeDescriptor>) -> Result<Self, LayoutError> {
        let Some(first) = attributes.first() else {
            return Err(LayoutError::Empty);
        };
        let stride = first.stride;

        let mut bytes = 0u32;
        for (i, attr) in attributes.iter().enumerate() {
            if !(1..=4).contains(&attr.components) {
                return Err(LayoutError::ComponentCount {
                    index: attr.index,
                    components: attr.components,
                });
            }
            if attributes[..i].iter().any(|a| a.index == attr.index) {
                return Err(LayoutError::DuplicateIndex { index: attr.index });
            }
            if attr.stride % ELEMENT_SIZE != 0 || attr.offset % ELEMENT_SIZE != 0 {
                return Err(LayoutError::Misaligned { index: attr.index });
            }
            if attr.stride != stride {
                return Err(LayoutError::StrideMismatch {
                    index: attr.index,
                    stride: attr.stride,
                    expected: stride,
                });
            }
            let end = attr.offset.saturating_add(attr.size());
            if end > stride {
                return Err(LayoutError::AttributeOverflow {
                    index: attr.index,
                    end,
                    stride,
                });
            }
            bytes = bytes.saturating_add(attr.size());
        }

        if bytes > stride {
            return Err(LayoutError::ExceedsStride { bytes, stride });
        }

        Ok(Self { attributes, stride })
    }

    /// Tightly packed layout from `(index, components)` pairs, in buffer order.
    pub fn packed(attributes: &[(u32, u32)]) -> Result<Self, LayoutError> {
        let stride = attributes
            .iter()
            .map(|&(_, components)| components.saturating_mul(ELEMENT_SIZE))
            .fold(0u32, u32::saturating_add);

        let mut offset = 0u32;
        let descriptors = attributes
            .iter()
            .map(|&(index, components)| {
                let attr = AttributeDescriptor::new(index, components, stride, offset);
                offset = offset.saturating_add(components.saturating_mul(ELEMENT_SIZE));
                attr
            })
            .collect();

        Self::new(descriptors)
    }

    #[inline]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Bytes per vertex.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// `f32` values consumed per vertex; the stride expressed in elements.
    #[inline]
    pub fn components_per_vertex(&self) -> u32 {
        self.stride / ELEMENT_SIZE
    }

    pub fn attribute(&self, index: u32) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.index == index)
    }
}
