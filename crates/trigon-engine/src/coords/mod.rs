//! Plain value types shared by the render loop and the backends.

mod color;
mod viewport;

pub use color::ClearColor;
pub use viewport::ViewportState;
