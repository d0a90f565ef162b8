/// RGBA color used to clear the color target at the start of a frame.
///
/// Components are written to the target unmodified.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Dark teal, the default background of the viewer.
    #[inline]
    pub const fn slate() -> Self {
        Self::new(0.0, 0.2, 0.3, 1.0)
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::slate()
    }
}
