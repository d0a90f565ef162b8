//! naga front end and stage-interface reflection.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::source::ShaderSource;

/// One `@location(n)` binding on a stage boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IoSlot {
    pub location: u32,
    pub ty: naga::TypeInner,
}

impl IoSlot {
    /// Scalar/vector width; 0 for types that cannot cross a stage boundary.
    pub fn components(&self) -> u32 {
        match self.ty {
            naga::TypeInner::Scalar(_) => 1,
            naga::TypeInner::Vector { size, .. } => size as u32,
            _ => 0,
        }
    }

    /// True for 32-bit float scalars and vectors, the only kind a mesh
    /// attribute or the colour target carries.
    pub fn is_f32(&self) -> bool {
        match self.ty {
            naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => {
                scalar.kind == naga::ScalarKind::Float && scalar.width == 4
            }
            _ => false,
        }
    }
}

/// What the linker needs to know about a compiled stage.
#[derive(Debug, Clone)]
pub(crate) struct StageInterface {
    pub entry_point: String,
    pub inputs: Vec<IoSlot>,
    pub outputs: Vec<IoSlot>,
}

/// Parses and validates `source`, then reflects its single entry point for the
/// source's stage. The error is the rendered diagnostic text.
pub(crate) fn front_end(source: &ShaderSource) -> Result<StageInterface, String> {
    let text = source.text();

    let module = naga::front::wgsl::parse_str(text).map_err(|e| e.emit_to_string(text))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| e.emit_to_string(text))?;

    let stage = source.stage();
    let mut candidates = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.to_naga());

    let ep = match (candidates.next(), candidates.next()) {
        (Some(ep), None) => ep,
        (None, _) => return Err(format!("error: no @{stage} entry point declared")),
        (Some(_), Some(_)) => {
            return Err(format!("error: more than one @{stage} entry point declared"));
        }
    };

    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(&module, arg.binding.as_ref(), arg.ty, &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(&module, result.binding.as_ref(), result.ty, &mut outputs);
    }

    inputs.sort_by_key(|slot| slot.location);
    outputs.sort_by_key(|slot| slot.location);

    Ok(StageInterface {
        entry_point: ep.name.clone(),
        inputs,
        outputs,
    })
}

/// Walks an argument or result, descending into unbound structs.
fn collect_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<IoSlot>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(IoSlot {
            location: *location,
            ty: module.types[ty].inner.clone(),
        }),
        Some(_) => {} // builtins
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

/// Link-time check: every fragment input must be written by the vertex stage
/// at the same location with the same type. Returns one log line per problem.
pub(crate) fn interface_mismatches(vertex: &StageInterface, fragment: &StageInterface) -> Vec<String> {
    fragment
        .inputs
        .iter()
        .filter_map(|input| {
            match vertex.outputs.iter().find(|o| o.location == input.location) {
                None => Some(format!(
                    "error: fragment input at location {} is not written by the vertex stage",
                    input.location
                )),
                Some(output) if output.ty != input.ty => Some(format!(
                    "error: location {} type mismatch: vertex writes {:?}, fragment reads {:?}",
                    input.location, output.ty, input.ty
                )),
                Some(_) => None,
            }
        })
        .collect()
}

/// Link-time check of the outer boundaries: vertex inputs are fed from f32
/// mesh data and fragment location 0 writes the float colour target.
pub(crate) fn scalar_kind_problems(vertex: &StageInterface, fragment: &StageInterface) -> Vec<String> {
    let inputs = vertex.inputs.iter().filter(|i| !i.is_f32()).map(|i| {
        format!(
            "error: vertex input at location {} is {:?}, meshes only supply f32 data",
            i.location, i.ty
        )
    });
    let target = fragment
        .outputs
        .iter()
        .filter(|o| o.location == 0 && !o.is_f32())
        .map(|o| format!("error: fragment output at location 0 is {:?}, the colour target takes f32", o.ty));
    inputs.chain(target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn reflects_vertex_inputs_and_entry_point() {
        let iface = front_end(&ShaderSource::vertex(fixtures::TRIANGLE_VS)).unwrap();
        assert_eq!(iface.entry_point, "vs_main");
        assert_eq!(iface.inputs.len(), 1);
        assert_eq!(iface.inputs[0].location, 0);
        assert_eq!(iface.inputs[0].components(), 3);
        assert!(iface.outputs.is_empty(), "builtin position is not a location slot");
    }

    #[test]
    fn struct_outputs_are_flattened() {
        let iface = front_end(&ShaderSource::vertex(fixtures::VARYING_VS)).unwrap();
        let locations: Vec<u32> = iface.outputs.iter().map(|s| s.location).collect();
        assert_eq!(locations, vec![0]);
        assert_eq!(iface.outputs[0].components(), 3);
    }

    #[test]
    fn stage_without_matching_entry_point_is_rejected() {
        let err = front_end(&ShaderSource::vertex(fixtures::TRIANGLE_FS)).unwrap_err();
        assert!(err.contains("no @vertex entry point"), "{err}");
    }

    #[test]
    fn matching_varyings_have_no_mismatch() {
        let vs = front_end(&ShaderSource::vertex(fixtures::VARYING_VS)).unwrap();
        let fs = front_end(&ShaderSource::fragment(fixtures::VARYING_FS)).unwrap();
        assert!(interface_mismatches(&vs, &fs).is_empty());
    }

    #[test]
    fn unwritten_fragment_input_is_reported() {
        let vs = front_end(&ShaderSource::vertex(fixtures::TRIANGLE_VS)).unwrap();
        let fs = front_end(&ShaderSource::fragment(fixtures::VARYING_FS)).unwrap();
        let problems = interface_mismatches(&vs, &fs);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("location 0"), "{}", problems[0]);
    }

    #[test]
    fn float_boundaries_have_no_kind_problem() {
        let vs = front_end(&ShaderSource::vertex(fixtures::VARYING_VS)).unwrap();
        let fs = front_end(&ShaderSource::fragment(fixtures::VARYING_FS)).unwrap();
        assert!(vs.inputs.iter().all(IoSlot::is_f32));
        assert!(scalar_kind_problems(&vs, &fs).is_empty());
    }

    #[test]
    fn integer_vertex_input_is_reported() {
        let vs = front_end(&ShaderSource::vertex(fixtures::UINT_INPUT_VS)).unwrap();
        let fs = front_end(&ShaderSource::fragment(fixtures::TRIANGLE_FS)).unwrap();
        assert_eq!(vs.inputs[0].components(), 3);
        assert!(!vs.inputs[0].is_f32());
        let problems = scalar_kind_problems(&vs, &fs);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("vertex input at location 0"), "{}", problems[0]);
    }

    #[test]
    fn integer_colour_output_is_reported() {
        let vs = front_end(&ShaderSource::vertex(fixtures::TRIANGLE_VS)).unwrap();
        let fs = front_end(&ShaderSource::fragment(fixtures::UINT_OUTPUT_FS)).unwrap();
        let problems = scalar_kind_problems(&vs, &fs);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("fragment output at location 0"), "{}", problems[0]);
    }
}
