//! Shader build pipeline: WGSL source → compiled units → linked program.
//!
//! Compilation runs the naga front end (parse + validate) so diagnostics and
//! interface reflection do not depend on a live GPU. The backend only receives
//! sources that already compiled.

mod program;
mod reflect;
mod source;
mod unit;

pub use program::{link, LinkStatus, ShaderProgram, VertexInput};
pub use source::{ShaderSource, ShaderStage};
pub use unit::{compile, CompileStatus, ShaderUnit, MAX_INFO_LOG_LEN};
