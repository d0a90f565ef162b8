use std::fmt;
use std::rc::Rc;

use crate::backend::GpuBackend;
use crate::frame::RenderContext;

use super::reflect::{self, StageInterface};
use super::source::ShaderStage;
use super::unit::{bound_log, ShaderUnit};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinkStatus {
    /// Program object allocated, link not yet attempted.
    Pending,
    Success,
    Failed,
}

/// A `@location` input of the vertex stage, which a mesh layout must feed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexInput {
    pub location: u32,
    pub components: u32,
}

/// Linked program.
///
/// Only a program with [`LinkStatus::Success`] may be bound for drawing; a
/// failed one keeps its log and owns no GPU object.
pub struct ShaderProgram<B: GpuBackend> {
    backend: Rc<B>,
    handle: Option<B::Program>,
    status: LinkStatus,
    log: String,
    vertex_inputs: Vec<VertexInput>,
}

impl<B: GpuBackend> ShaderProgram<B> {
    fn failed(backend: Rc<B>, log: String) -> Self {
        log::debug!("shader program linking failed");
        Self {
            backend,
            handle: None,
            status: LinkStatus::Failed,
            log: bound_log(log),
            vertex_inputs: Vec::new(),
        }
    }

    #[inline]
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.status == LinkStatus::Success
    }

    /// Diagnostic text; empty for a successful link.
    #[inline]
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Vertex-stage inputs, sorted by location.
    #[inline]
    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }

    pub(crate) fn handle(&self) -> Option<&B::Program> {
        self.handle.as_ref()
    }
}

impl<B: GpuBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        if let Some(program) = self.handle.take() {
            log::debug!("releasing shader program");
            self.backend.delete_program(program);
        }
    }
}

impl<B: GpuBackend> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("status", &self.status)
            .field("log", &self.log)
            .field("vertex_inputs", &self.vertex_inputs)
            .finish_non_exhaustive()
    }
}

/// Links `units` into a program.
///
/// The units are consumed: whatever the outcome, every unit's GPU object is
/// released before this returns, so a unit can never be attached twice.
///
/// The link fails (no program object is kept) when
/// - the set is not exactly one vertex and one fragment unit,
/// - any unit did not compile,
/// - a fragment input is not written by the vertex stage with the same type,
/// - the backend rejects the link.
pub fn link<B: GpuBackend>(ctx: &RenderContext<B>, units: Vec<ShaderUnit<B>>) -> ShaderProgram<B> {
    let backend = Rc::clone(ctx.backend());

    let (vertex, fragment) = match stage_pair(&units) {
        Ok(pair) => pair,
        Err(log) => return ShaderProgram::failed(backend, log),
    };

    let mut mismatches = reflect::interface_mismatches(vertex, fragment);
    mismatches.extend(reflect::scalar_kind_problems(vertex, fragment));
    if !mismatches.is_empty() {
        return ShaderProgram::failed(backend, mismatches.join("\n"));
    }

    let vertex_inputs = vertex
        .inputs
        .iter()
        .map(|slot| VertexInput {
            location: slot.location,
            components: slot.components(),
        })
        .collect();

    let mut program = ShaderProgram {
        backend: Rc::clone(&backend),
        handle: Some(backend.create_program()),
        status: LinkStatus::Pending,
        log: String::new(),
        vertex_inputs,
    };

    if let Some(handle) = program.handle.as_mut() {
        for shader in units.iter().filter_map(ShaderUnit::handle) {
            backend.attach_shader(handle, shader);
        }
        let outcome = backend.link_program(handle);

        // Attached units are no longer needed.
        drop(units);

        match outcome {
            Ok(()) => {
                program.status = LinkStatus::Success;
                log::debug!("linked shader program");
            }
            Err(log) => {
                // Dropping the failed program releases its object.
                return ShaderProgram::failed(backend, log);
            }
        }
    }

    program
}

/// Checks the unit set and returns the vertex and fragment interfaces.
fn stage_pair<B: GpuBackend>(
    units: &[ShaderUnit<B>],
) -> Result<(&StageInterface, &StageInterface), String> {
    let mut log = Vec::new();

    for unit in units.iter().filter(|u| !u.is_compiled()) {
        log.push(format!("error: {} unit did not compile ({:?})", unit.stage(), unit.status()));
    }

    let mut pick = |stage: ShaderStage| {
        let mut matching = units.iter().filter(|u| u.stage() == stage);
        match (matching.next(), matching.next()) {
            (Some(unit), None) => unit.interface(),
            (None, _) => {
                log.push(format!("error: no {stage} stage attached"));
                None
            }
            (Some(_), Some(_)) => {
                log.push(format!("error: more than one {stage} stage attached"));
                None
            }
        }
    };

    let vertex = pick(ShaderStage::Vertex);
    let fragment = pick(ShaderStage::Fragment);

    match (vertex, fragment) {
        (Some(v), Some(f)) if log.is_empty() => Ok((v, f)),
        _ => Err(log.join("\n")),
    }
}
