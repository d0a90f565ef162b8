/// Size of the pixel rectangle NDC is mapped onto, in physical pixels.
///
/// The origin is always `(0, 0)`; only the extent changes on resize.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
}

impl ViewportState {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero extent; nothing can be drawn into it.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for ViewportState {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extent_is_empty() {
        assert!(ViewportState::new(0, 600).is_empty());
        assert!(ViewportState::new(800, 0).is_empty());
        assert!(!ViewportState::new(800, 600).is_empty());
    }

    #[test]
    fn converts_from_physical_size() {
        let vp: ViewportState = winit::dpi::PhysicalSize::new(1024u32, 768u32).into();
        assert_eq!(vp, ViewportState::new(1024, 768));
    }
}
