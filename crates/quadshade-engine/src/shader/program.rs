use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

use super::source::ShaderSources;
use super::uniform::{UniformError, UniformSlot, UniformStatus, UniformType, UniformValue};

/// Pipeline stage of a shader module.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// Errors raised while compiling and linking a shader program.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("{stage} shader failed to parse:\n{diagnostic}")]
    Parse { stage: Stage, diagnostic: String },

    #[error("{stage} shader failed validation:\n{diagnostic}")]
    Validation { stage: Stage, diagnostic: String },

    #[error("expected exactly one @{stage} entry point, found {found}")]
    EntryPoint { stage: Stage, found: usize },

    #[error("vertex entry point `{entry_point}` has no vec2<f32> input at @location(0)")]
    MissingPositionInput { entry_point: String },

    #[error("vertex entry point `{entry_point}` reads unbound input @location({location})")]
    UnsupportedVertexInput { entry_point: String, location: u32 },

    #[error("fragment input at @location({location}) has no vertex output of the same type")]
    UnlinkedFragmentInput { location: u32 },

    #[error("{stage} shader binds `{name}` outside the uniform address space")]
    UnsupportedResource { stage: Stage, name: String },

    #[error("{stage} shader binds `{name}` in group {group}; only group 0 is supported")]
    UnsupportedGroup { stage: Stage, name: String, group: u32 },

    #[error("{stage} shader declares uniform `{name}` with an unsupported type")]
    UnsupportedUniformType { stage: Stage, name: String },

    #[error("uniform `{name}` is declared differently in the vertex and fragment shaders")]
    ConflictingUniform { name: String },

    #[error("uniforms `{first}` and `{second}` share binding {binding}")]
    BindingCollision {
        binding: u32,
        first: String,
        second: String,
    },

    #[error("uniform `{name}` must be {expected}, found {found}")]
    UniformType {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
}

/// WGSL text of one stage plus its entry point name.
#[derive(Debug, Clone)]
pub struct StageSource {
    source: String,
    entry_point: String,
}

impl StageSource {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// A compiled vertex + fragment pair and its uniform slots.
///
/// The program itself is immutable; only uniform values change.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex: StageSource,
    fragment: StageSource,
    /// Sorted by binding.
    uniforms: Vec<UniformSlot>,
}

impl ShaderProgram {
    /// Parses, validates and reflects both stages.
    pub fn compile(sources: &ShaderSources) -> Result<Self, CompileError> {
        let vs = parse_module(Stage::Vertex, sources.vertex())?;
        let fs = parse_module(Stage::Fragment, sources.fragment())?;

        let vs_ep = entry_point(Stage::Vertex, &vs)?;
        let fs_ep = entry_point(Stage::Fragment, &fs)?;
        check_vertex_inputs(&vs, vs_ep)?;
        check_stage_link(&vs, vs_ep, &fs, fs_ep)?;

        let vs_entry = vs_ep.name.clone();
        let fs_entry = fs_ep.name.clone();

        let mut uniforms = Vec::new();
        collect_uniforms(Stage::Vertex, &vs, &mut uniforms)?;
        collect_uniforms(Stage::Fragment, &fs, &mut uniforms)?;
        uniforms.sort_by_key(UniformSlot::binding);

        log::debug!(
            "compiled shader program {vs_entry}/{fs_entry} with {} uniform(s)",
            uniforms.len()
        );

        Ok(Self {
            vertex: StageSource {
                source: sources.vertex().to_owned(),
                entry_point: vs_entry,
            },
            fragment: StageSource {
                source: sources.fragment().to_owned(),
                entry_point: fs_entry,
            },
            uniforms,
        })
    }

    pub fn vertex(&self) -> &StageSource {
        &self.vertex
    }

    pub fn fragment(&self) -> &StageSource {
        &self.fragment
    }

    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformSlot> {
        self.uniforms.iter().find(|u| u.name() == name)
    }

    /// Stores `value` in the uniform named `name`.
    ///
    /// A name the program does not declare is ignored.
    pub fn set_uniform(
        &mut self,
        name: &str,
        value: UniformValue,
    ) -> Result<UniformStatus, UniformError> {
        match self.uniforms.iter_mut().find(|u| u.name() == name) {
            Some(slot) => slot.set(value).map(|()| UniformStatus::Set),
            None => Ok(UniformStatus::Ignored),
        }
    }

    /// Checks that `name`, if declared, has type `expected`.
    pub fn expect_uniform_type(
        &self,
        name: &str,
        expected: UniformType,
    ) -> Result<(), CompileError> {
        match self.uniform(name) {
            Some(slot) if slot.ty() != expected => Err(CompileError::UniformType {
                name: name.to_owned(),
                expected,
                found: slot.ty(),
            }),
            _ => Ok(()),
        }
    }

    /// Hands every changed uniform to `write` and marks it clean.
    pub(crate) fn flush_dirty(&mut self, mut write: impl FnMut(u32, &[u8])) {
        for slot in self.uniforms.iter_mut().filter(|u| u.is_dirty()) {
            write(slot.binding(), slot.value().as_bytes());
            slot.mark_clean();
        }
    }
}

fn parse_module(stage: Stage, source: &str) -> Result<naga::Module, CompileError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| CompileError::Parse {
        stage,
        diagnostic: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| CompileError::Validation {
            stage,
            diagnostic: e.emit_to_string(source),
        })?;

    Ok(module)
}

fn entry_point(
    stage: Stage,
    module: &naga::Module,
) -> Result<&naga::EntryPoint, CompileError> {
    let found: Vec<&naga::EntryPoint> = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.naga())
        .collect();

    match found.as_slice() {
        [ep] => Ok(*ep),
        _ => Err(CompileError::EntryPoint {
            stage,
            found: found.len(),
        }),
    }
}

/// `(location, type)` of every `@location` value, looking through structs.
fn locations<'m>(
    module: &'m naga::Module,
    values: impl Iterator<Item = (Option<&'m naga::Binding>, naga::Handle<naga::Type>)>,
) -> Vec<(u32, &'m naga::TypeInner)> {
    let mut out = Vec::new();
    let mut push = |binding: Option<&naga::Binding>, ty: naga::Handle<naga::Type>| {
        if let Some(naga::Binding::Location { location, .. }) = binding {
            out.push((*location, &module.types[ty].inner));
        }
    };

    for (binding, ty) in values {
        match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => {
                for m in members {
                    push(m.binding.as_ref(), m.ty);
                }
            }
            _ => push(binding, ty),
        }
    }
    out
}

fn inputs<'m>(
    module: &'m naga::Module,
    ep: &'m naga::EntryPoint,
) -> Vec<(u32, &'m naga::TypeInner)> {
    let args = ep.function.arguments.iter().map(|a| (a.binding.as_ref(), a.ty));
    locations(module, args)
}

fn outputs<'m>(
    module: &'m naga::Module,
    ep: &'m naga::EntryPoint,
) -> Vec<(u32, &'m naga::TypeInner)> {
    let result = ep.function.result.iter().map(|r| (r.binding.as_ref(), r.ty));
    locations(module, result)
}

/// The quad is bound as one `Float32x2` attribute at location 0 and nothing else.
fn check_vertex_inputs(
    module: &naga::Module,
    ep: &naga::EntryPoint,
) -> Result<(), CompileError> {
    let mut has_position = false;

    for (location, inner) in inputs(module, ep) {
        if location != 0 {
            return Err(CompileError::UnsupportedVertexInput {
                entry_point: ep.name.clone(),
                location,
            });
        }
        has_position = UniformType::from_naga(inner) == Some(UniformType::Vec2);
    }

    if has_position {
        Ok(())
    } else {
        Err(CompileError::MissingPositionInput {
            entry_point: ep.name.clone(),
        })
    }
}

/// Every fragment input must be written by the vertex stage with the same type.
fn check_stage_link(
    vs: &naga::Module,
    vs_ep: &naga::EntryPoint,
    fs: &naga::Module,
    fs_ep: &naga::EntryPoint,
) -> Result<(), CompileError> {
    let written = outputs(vs, vs_ep);

    for (location, inner) in inputs(fs, fs_ep) {
        if !written.iter().any(|&(l, ty)| l == location && ty == inner) {
            return Err(CompileError::UnlinkedFragmentInput { location });
        }
    }
    Ok(())
}

fn collect_uniforms(
    stage: Stage,
    module: &naga::Module,
    uniforms: &mut Vec<UniformSlot>,
) -> Result<(), CompileError> {
    for (_, var) in module.global_variables.iter() {
        // Private and workgroup globals carry no resource binding.
        let Some(binding) = &var.binding else { continue };
        let name = var.name.clone().unwrap_or_default();

        if !matches!(var.space, naga::AddressSpace::Uniform) {
            return Err(CompileError::UnsupportedResource { stage, name });
        }
        if binding.group != 0 {
            return Err(CompileError::UnsupportedGroup {
                stage,
                name,
                group: binding.group,
            });
        }
        let Some(ty) = UniformType::from_naga(&module.types[var.ty].inner) else {
            return Err(CompileError::UnsupportedUniformType { stage, name });
        };

        if let Some(existing) = uniforms.iter().find(|u| u.name() == name) {
            if existing.binding() != binding.binding || existing.ty() != ty {
                return Err(CompileError::ConflictingUniform { name });
            }
            continue;
        }
        if let Some(existing) = uniforms.iter().find(|u| u.binding() == binding.binding) {
            return Err(CompileError::BindingCollision {
                binding: binding.binding,
                first: existing.name().to_owned(),
                second: name,
            });
        }

        uniforms.push(UniformSlot::new(name, binding.binding, ty));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
@group(0) @binding(0) var<uniform> u_resolution: vec2<f32>;

@vertex
fn vs_main(@location(0) in_position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(in_position, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
@group(0) @binding(0) var<uniform> u_resolution: vec2<f32>;
@group(0) @binding(1) var<uniform> u_time: f32;

@fragment
fn fs_main(@builtin(position) frag_coord: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = frag_coord.xy / u_resolution;
    return vec4<f32>(uv, 0.5 + 0.5 * sin(u_time), 1.0);
}
"#;

    const VS_PLAIN: &str = r#"
@vertex
fn vs_main(@location(0) in_position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(in_position, 0.0, 1.0);
}
"#;

    const FS_PLAIN: &str = r#"
@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 1.0, 1.0);
}
"#;

    fn compile(vs: &str, fs: &str) -> Result<ShaderProgram, CompileError> {
        ShaderProgram::compile(&ShaderSources::from_strings(vs, fs))
    }

    // ── reflection ────────────────────────────────────────────────────────

    #[test]
    fn reflects_entry_points_and_uniforms() {
        let program = compile(VS, FS).unwrap();
        assert_eq!(program.vertex().entry_point(), "vs_main");
        assert_eq!(program.fragment().entry_point(), "fs_main");

        let names: Vec<_> = program.uniforms().iter().map(|u| u.name()).collect();
        assert_eq!(names, ["u_resolution", "u_time"]);

        let time = program.uniform("u_time").unwrap();
        assert_eq!(time.binding(), 1);
        assert_eq!(time.ty(), UniformType::Float);
    }

    #[test]
    fn program_without_uniforms_compiles() {
        let program = compile(VS_PLAIN, FS_PLAIN).unwrap();
        assert!(program.uniforms().is_empty());
        assert_eq!(program.fragment().entry_point(), "main");
    }

    #[test]
    fn position_input_may_be_a_struct_member() {
        let vs = r#"
struct VsIn {
    @location(0) in_position: vec2<f32>,
};

@vertex
fn vs(input: VsIn) -> @builtin(position) vec4<f32> {
    return vec4<f32>(input.in_position, 0.0, 1.0);
}
"#;
        assert!(compile(vs, FS_PLAIN).is_ok());
    }

    // ── uniform writes ────────────────────────────────────────────────────

    #[test]
    fn unknown_uniform_is_ignored_without_side_effects() {
        let mut program = compile(VS, FS).unwrap();
        program.set_uniform("u_time", UniformValue::Float(3.0)).unwrap();

        let status = program
            .set_uniform("u_mouse", UniformValue::Vec2([1.0, 1.0]))
            .unwrap();
        assert_eq!(status, UniformStatus::Ignored);
        assert_eq!(program.uniform("u_time").unwrap().value(), UniformValue::Float(3.0));
        assert_eq!(
            program.uniform("u_resolution").unwrap().value(),
            UniformValue::Vec2([0.0, 0.0])
        );
    }

    #[test]
    fn flush_visits_only_dirty_slots_once() {
        let mut program = compile(VS, FS).unwrap();
        program.set_uniform("u_time", UniformValue::Float(1.0)).unwrap();

        let mut written = Vec::new();
        program.flush_dirty(|binding, bytes| written.push((binding, bytes.to_vec())));
        assert_eq!(written, vec![(1, 1.0f32.to_le_bytes().to_vec())]);

        written.clear();
        program.flush_dirty(|binding, bytes| written.push((binding, bytes.to_vec())));
        assert!(written.is_empty());
    }

    #[test]
    fn expect_uniform_type_checks_declared_uniforms_only() {
        let program = compile(VS, FS).unwrap();
        assert!(program.expect_uniform_type("u_time", UniformType::Float).is_ok());
        assert!(program.expect_uniform_type("u_absent", UniformType::Float).is_ok());
        assert!(matches!(
            program.expect_uniform_type("u_resolution", UniformType::Float),
            Err(CompileError::UniformType { .. })
        ));
    }

    // ── compile failures ──────────────────────────────────────────────────

    #[test]
    fn syntax_error_reports_stage() {
        let err = compile(VS, "@fragment fn broken( {").unwrap_err();
        assert!(matches!(err, CompileError::Parse { stage: Stage::Fragment, .. }), "{err}");
    }

    #[test]
    fn missing_entry_point_is_rejected() {
        let err = compile(FS_PLAIN, FS_PLAIN).unwrap_err();
        assert!(matches!(err, CompileError::EntryPoint { stage: Stage::Vertex, found: 0 }), "{err}");
    }

    #[test]
    fn vertex_without_position_input_is_rejected() {
        let vs = r#"
@vertex
fn vs(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(i), 0.0, 0.0, 1.0);
}
"#;
        let err = compile(vs, FS_PLAIN).unwrap_err();
        assert!(matches!(err, CompileError::MissingPositionInput { .. }), "{err}");
    }

    #[test]
    fn extra_vertex_input_is_rejected() {
        let vs = r#"
@vertex
fn vs_main(
    @location(0) in_position: vec2<f32>,
    @location(1) extra: vec4<f32>,
) -> @builtin(position) vec4<f32> {
    return vec4<f32>(in_position, 0.0, 1.0) + extra;
}
"#;
        let err = compile(vs, FS_PLAIN).unwrap_err();
        assert!(
            matches!(err, CompileError::UnsupportedVertexInput { location: 1, .. }),
            "{err}"
        );
    }

    #[test]
    fn fragment_input_without_vertex_output_is_rejected() {
        let fs = r#"
@fragment
fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;
        let err = compile(VS_PLAIN, fs).unwrap_err();
        assert!(matches!(err, CompileError::UnlinkedFragmentInput { location: 3 }), "{err}");
    }

    #[test]
    fn fragment_input_of_another_type_is_rejected() {
        let vs = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) in_position: vec2<f32>) -> VsOut {
    return VsOut(vec4<f32>(in_position, 0.0, 1.0), in_position);
}
"#;
        let fs = r#"
@fragment
fn fs_main(@location(0) uv: vec4<f32>) -> @location(0) vec4<f32> {
    return uv;
}
"#;
        let err = compile(vs, fs).unwrap_err();
        assert!(matches!(err, CompileError::UnlinkedFragmentInput { location: 0 }), "{err}");
    }

    #[test]
    fn varyings_written_by_the_vertex_stage_link() {
        let vs = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) in_position: vec2<f32>) -> VsOut {
    return VsOut(vec4<f32>(in_position, 0.0, 1.0), in_position * 0.5 + 0.5);
}
"#;
        let fs = r#"
@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;
        assert!(compile(vs, fs).is_ok());
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let fs = FS
            .replace("u_resolution: vec2<f32>", "u_resolution: vec4<f32>")
            .replace("frag_coord.xy / u_resolution", "frag_coord.xy / u_resolution.xy");
        let err = compile(VS, &fs).unwrap_err();
        assert!(matches!(err, CompileError::ConflictingUniform { ref name } if name == "u_resolution"), "{err}");
    }

    #[test]
    fn binding_collision_is_rejected() {
        let fs = FS
            .replace("@group(0) @binding(0) var<uniform> u_resolution: vec2<f32>;", "")
            .replace("@binding(1) var<uniform> u_time", "@binding(0) var<uniform> u_time")
            .replace("frag_coord.xy / u_resolution", "frag_coord.xy");
        let err = compile(VS, &fs).unwrap_err();
        assert!(matches!(err, CompileError::BindingCollision { binding: 0, .. }), "{err}");
    }

    #[test]
    fn textures_are_unsupported() {
        let fs = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;

@fragment
fn fs(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
    return textureLoad(tex, vec2<i32>(p.xy), 0);
}
"#;
        let err = compile(VS, fs).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedResource { stage: Stage::Fragment, .. }), "{err}");
    }

    #[test]
    fn other_bind_groups_are_unsupported() {
        let fs = FS.replace("@group(0) @binding(1)", "@group(1) @binding(1)");
        let err = compile(VS, &fs).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedGroup { group: 1, .. }), "{err}");
    }
}
