//! Linking and reflection.
//!
//! After both stages are compiled and linked, the program is asked for its
//! active attributes and uniforms. Each one becomes a binding keyed by name,
//! with its parsed [`TypeDescriptor`] and its location. Sampler uniforms are
//! additionally assigned a texture unit from a [`TextureUnitAllocator`] that
//! lives for exactly one build, so every program numbers its samplers 1..=N
//! in discovery order.

use std::collections::HashMap;

use crate::{
    context::{
        ActiveVariable, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage,
        UniformLocation,
    },
    error::{ProgramError, VariableKind},
    program::{
        ShaderSources,
        compile::compile,
        types::{TypeDescriptor, parse_type},
        uniform::UniformUpload,
    },
};

/// A reflected uniform.
///
/// `size` is the array length reported by the host (1 for non-arrays).
/// `texture_unit` is present iff the uniform is a sampler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformBinding {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub location: UniformLocation,
    pub size: u32,
    pub texture_unit: Option<u32>,
    pub(crate) upload: UniformUpload,
}

/// A reflected vertex attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeBinding {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub location: u32,
    pub size: u32,
}

/// Hands out texture units for sampler uniforms, starting at 1.
///
/// One allocator is created per build and threaded through the uniform pass;
/// units are never reused and never shared between programs.
#[derive(Debug, Default)]
pub struct TextureUnitAllocator {
    last: u32,
}

impl TextureUnitAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> u32 {
        self.last += 1;
        self.last
    }

    /// Number of units handed out so far.
    pub fn allocated(&self) -> u32 {
        self.last
    }
}

/// Strip the `[0]` suffix hosts append to array uniforms so `foo[0]` is stored as `foo`.
pub fn canonical_name(name: &str) -> &str {
    name.strip_suffix("[0]").unwrap_or(name)
}

// Built-ins and uniform block members are active but have no location.
fn skip_unaddressable(kind: VariableKind, name: &str) {
    if name.starts_with("gl_") {
        log::debug!("Skipping built-in {kind} {name}");
    } else {
        log::debug!("Skipping {kind} {name}: no location, likely a uniform block member");
    }
}

pub(crate) struct Reflection {
    pub program: ProgramHandle,
    pub attributes: HashMap<String, AttributeBinding>,
    pub uniforms: HashMap<String, UniformBinding>,
    pub texture_units: u32,
}

/// Compile, link and reflect a program.
///
/// Nothing outlives a failed build: shaders are released as soon as linking is
/// done (successful or not) and the program object is released if linking or
/// reflection fails.
pub(crate) fn build<C: GraphicsContext + ?Sized>(
    ctx: &C,
    sources: &ShaderSources,
) -> Result<Reflection, ProgramError> {
    let vertex = compile(ctx, ShaderStage::Vertex, &sources.vertex)?;
    let fragment = match compile(ctx, ShaderStage::Fragment, &sources.fragment) {
        Ok(fragment) => fragment,
        Err(e) => {
            ctx.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = link(ctx, vertex, fragment);
    ctx.delete_shader(vertex);
    ctx.delete_shader(fragment);
    let program = linked?;

    let mut units = TextureUnitAllocator::new();
    let tables = reflect_attributes(ctx, program).and_then(|attributes| {
        reflect_uniforms(ctx, program, &mut units).map(|uniforms| (attributes, uniforms))
    });
    match tables {
        Ok((attributes, uniforms)) => Ok(Reflection {
            program,
            attributes,
            uniforms,
            texture_units: units.allocated(),
        }),
        Err(e) => {
            ctx.delete_program(program);
            Err(e)
        }
    }
}

fn link<C: GraphicsContext + ?Sized>(
    ctx: &C,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> Result<ProgramHandle, ProgramError> {
    let program = ctx.create_program();
    ctx.attach_shader(program, vertex);
    ctx.attach_shader(program, fragment);
    ctx.link_program(program);

    if !ctx.program_link_status(program) {
        let log = ctx.program_info_log(program);
        ctx.delete_program(program);
        log::error!("The program failed to link:\n{log}");
        return Err(ProgramError::Link { log });
    }
    Ok(program)
}

fn reflect_attributes<C: GraphicsContext + ?Sized>(
    ctx: &C,
    program: ProgramHandle,
) -> Result<HashMap<String, AttributeBinding>, ProgramError> {
    let mut attributes = HashMap::new();
    for index in 0..ctx.active_attribute_count(program) {
        let ActiveVariable {
            name,
            type_token,
            size,
        } = ctx
            .active_attribute(program, index)
            .ok_or(ProgramError::Query {
                kind: VariableKind::Attribute,
                index,
            })?;
        let descriptor = parse_type(&type_token)?;
        let Some(location) = ctx.attribute_location(program, &name) else {
            skip_unaddressable(VariableKind::Attribute, &name);
            continue;
        };
        attributes.insert(
            name.clone(),
            AttributeBinding {
                name,
                descriptor,
                location,
                size,
            },
        );
    }
    Ok(attributes)
}

fn reflect_uniforms<C: GraphicsContext + ?Sized>(
    ctx: &C,
    program: ProgramHandle,
    units: &mut TextureUnitAllocator,
) -> Result<HashMap<String, UniformBinding>, ProgramError> {
    let mut uniforms = HashMap::new();
    for index in 0..ctx.active_uniform_count(program) {
        let ActiveVariable {
            name,
            type_token,
            size,
        } = ctx
            .active_uniform(program, index)
            .ok_or(ProgramError::Query {
                kind: VariableKind::Uniform,
                index,
            })?;
        let descriptor = parse_type(&type_token)?;
        let Some(location) = ctx.uniform_location(program, &name) else {
            skip_unaddressable(VariableKind::Uniform, &name);
            continue;
        };
        let texture_unit = descriptor.is_sampler().then(|| units.allocate());
        let upload = UniformUpload::resolve(&descriptor, texture_unit, &type_token)?;

        let name = canonical_name(&name).to_string();
        uniforms.insert(
            name.clone(),
            UniformBinding {
                name,
                descriptor,
                location,
                size,
                texture_unit,
                upload,
            },
        );
    }
    Ok(uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_starts_at_one_and_never_repeats() {
        let mut units = TextureUnitAllocator::new();
        assert_eq!(units.allocated(), 0);
        let handed_out: Vec<u32> = (0..5).map(|_| units.allocate()).collect();
        assert_eq!(handed_out, vec![1, 2, 3, 4, 5]);
        assert_eq!(units.allocated(), 5);
    }

    #[test]
    fn independent_allocators_do_not_share_state() {
        let mut first = TextureUnitAllocator::new();
        first.allocate();
        first.allocate();
        let mut second = TextureUnitAllocator::new();
        assert_eq!(second.allocate(), 1);
    }

    #[test]
    fn canonical_name_strips_only_a_trailing_first_element() {
        assert_eq!(canonical_name("uLights[0]"), "uLights");
        assert_eq!(canonical_name("uLights"), "uLights");
        assert_eq!(canonical_name("uLights[1]"), "uLights[1]");
        assert_eq!(canonical_name("uLights[0].color"), "uLights[0].color");
        assert_eq!(canonical_name("[0]"), "");
    }
}
