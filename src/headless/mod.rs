//! A GPU-free graphics context.
//!
//! [`HeadlessContext`] implements [`GraphicsContext`] on the CPU. Shaders are
//! "compiled" by the [`glsl`] declaration scanner and "linked" by matching the
//! stage interfaces, after which reflection reports what a GL driver would:
//! only variables a function body references are active, arrays are reported
//! as `name[0]` with their length, and types are GL tokens.
//!
//! The context keeps track of which shader and program objects are alive and
//! records every bind and upload call as a [`Call`], which makes it the test
//! double for everything built on top of [`Program`](crate::Program).

use std::{cell::RefCell, collections::HashMap};

use crate::{
    context::{
        ActiveVariable, BufferHandle, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage,
        TextureHandle, TextureTarget, UniformLocation,
    },
    program::types::BaseType,
};

pub mod glsl;

use glsl::{Declaration, StageInterface};

/// A state-changing call recorded by [`HeadlessContext`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    UseProgram(Option<ProgramHandle>),
    BindArrayBuffer(Option<BufferHandle>),
    VertexAttribPointer {
        location: u32,
        size: u8,
        base_type: BaseType,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    EnableVertexAttribArray(u32),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureHandle>),
    UniformF32 {
        location: UniformLocation,
        components: u8,
        values: Vec<f32>,
    },
    UniformI32 {
        location: UniformLocation,
        components: u8,
        values: Vec<i32>,
    },
    UniformMatrixF32 {
        location: UniformLocation,
        dimension: u8,
        transpose: bool,
        values: Vec<f32>,
    },
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<Result<StageInterface, String>>,
}

#[derive(Debug)]
struct LinkedAttribute {
    active: ActiveVariable,
    location: u32,
}

#[derive(Debug)]
struct LinkedUniform {
    active: ActiveVariable,
    /// Name without the `[0]` suffix.
    base_name: String,
    location: i32,
}

#[derive(Debug, Default)]
struct LinkedProgram {
    attributes: Vec<LinkedAttribute>,
    uniforms: Vec<LinkedUniform>,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderHandle>,
    linked: Option<Result<LinkedProgram, String>>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    current_program: Option<ProgramHandle>,
    active_texture: u32,
    bound_textures: HashMap<(u32, TextureTarget), TextureHandle>,
    calls: Vec<Call>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, call: Call) {
        log::trace!("{call:?}");
        self.calls.push(call);
    }

    fn linked(&self, program: ProgramHandle) -> Option<&LinkedProgram> {
        match self.programs.get(&program.0)?.linked.as_ref()? {
            Ok(linked) => Some(linked),
            Err(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessContext {
    state: RefCell<State>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a buffer handle. Buffers carry no data in a headless context.
    pub fn create_buffer(&self) -> BufferHandle {
        BufferHandle(self.state.borrow_mut().next_id())
    }

    /// Mint a texture handle.
    pub fn create_texture(&self) -> TextureHandle {
        TextureHandle(self.state.borrow_mut().next_id())
    }

    /// Number of shader objects created and not yet deleted.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Number of program objects created and not yet deleted.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn is_program_live(&self, program: ProgramHandle) -> bool {
        self.state.borrow().programs.contains_key(&program.0)
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    /// Texture bound to `target` on texture unit `unit`.
    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> Option<TextureHandle> {
        self.state
            .borrow()
            .bound_textures
            .get(&(unit, target))
            .copied()
    }

    /// Every recorded call so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Return and forget the recorded calls.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }
}

fn link(
    shaders: &HashMap<u32, ShaderObject>,
    attached: &[ShaderHandle],
) -> Result<LinkedProgram, String> {
    let mut vertex: Option<&StageInterface> = None;
    let mut fragment: Option<&StageInterface> = None;
    for handle in attached {
        let Some(shader) = shaders.get(&handle.0) else {
            return Err(format!("ERROR: attached shader {} no longer exists", handle.0));
        };
        let Some(Ok(interface)) = &shader.compiled else {
            return Err(format!("ERROR: attached {} shader is not compiled", shader.stage));
        };
        let slot = match shader.stage {
            ShaderStage::Vertex => &mut vertex,
            ShaderStage::Fragment => &mut fragment,
        };
        if slot.replace(interface).is_some() {
            return Err(format!("ERROR: more than one {} shader attached", shader.stage));
        }
    }
    let vertex = vertex.ok_or("ERROR: no vertex shader attached")?;
    let fragment = fragment.ok_or("ERROR: no fragment shader attached")?;
    if !vertex.has_main {
        return Err("ERROR: Missing main() in vertex shader".to_string());
    }
    if !fragment.has_main {
        return Err("ERROR: Missing main() in fragment shader".to_string());
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|output| output.name == input.name) {
            None => {
                return Err(format!(
                    "ERROR: Varying `{}` is not declared in the vertex shader",
                    input.name
                ));
            }
            Some(output)
                if output.glsl_type != input.glsl_type || output.array_len != input.array_len =>
            {
                return Err(format!(
                    "ERROR: Varying `{}` has different types in the vertex and fragment shaders",
                    input.name
                ));
            }
            Some(_) => {}
        }
    }

    Ok(LinkedProgram {
        attributes: link_attributes(vertex),
        uniforms: link_uniforms(vertex, fragment)?,
    })
}

fn link_attributes(vertex: &StageInterface) -> Vec<LinkedAttribute> {
    let mut taken: Vec<u32> = vertex.inputs.iter().filter_map(|input| input.location).collect();
    let mut next = 0;
    vertex
        .inputs
        .iter()
        .filter(|input| input.used)
        .map(|input| {
            let location = input.location.unwrap_or_else(|| {
                while taken.contains(&next) {
                    next += 1;
                }
                taken.push(next);
                next
            });
            LinkedAttribute {
                active: active_variable(input),
                location,
            }
        })
        .collect()
}

fn link_uniforms(
    vertex: &StageInterface,
    fragment: &StageInterface,
) -> Result<Vec<LinkedUniform>, String> {
    let mut merged: Vec<Declaration> = Vec::new();
    for uniform in vertex.uniforms.iter().chain(&fragment.uniforms) {
        match merged.iter_mut().find(|known| known.name == uniform.name) {
            Some(known) => {
                if known.glsl_type != uniform.glsl_type || known.array_len != uniform.array_len {
                    return Err(format!(
                        "ERROR: Uniform `{}` has different types in the vertex and fragment shaders",
                        uniform.name
                    ));
                }
                known.used |= uniform.used;
            }
            None => merged.push(uniform.clone()),
        }
    }

    let mut location = 0;
    Ok(merged
        .iter()
        .filter(|uniform| uniform.used)
        .map(|uniform| {
            let linked = LinkedUniform {
                active: active_variable(uniform),
                base_name: uniform.name.clone(),
                location,
            };
            location += uniform.array_len.unwrap_or(1) as i32;
            linked
        })
        .collect())
}

fn active_variable(declaration: &Declaration) -> ActiveVariable {
    let name = match declaration.array_len {
        Some(_) => format!("{}[0]", declaration.name),
        None => declaration.name.clone(),
    };
    ActiveVariable {
        name,
        type_token: glsl::type_token(&declaration.glsl_type),
        size: declaration.array_len.unwrap_or(1),
    }
}

/// Resolve `name` (`foo`, `foo[0]` or `foo[k]`) against a linked uniform.
fn element_location(uniform: &LinkedUniform, name: &str) -> Option<i32> {
    if name == uniform.base_name {
        return Some(uniform.location);
    }
    let index: u32 = name
        .strip_prefix(uniform.base_name.as_str())?
        .strip_prefix('[')?
        .strip_suffix(']')?
        .parse()
        .ok()?;
    (uniform.active.name.ends_with("[0]") && index < uniform.active.size)
        .then(|| uniform.location + index as i32)
}

impl GraphicsContext for HeadlessContext {
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: None,
            },
        );
        ShaderHandle(id)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        if let Some(shader) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            shader.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        if let Some(shader) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            shader.compiled = Some(glsl::scan(shader.stage, &shader.source));
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        matches!(
            self.state.borrow().shaders.get(&shader.0),
            Some(ShaderObject {
                compiled: Some(Ok(_)),
                ..
            })
        )
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        match self.state.borrow().shaders.get(&shader.0) {
            Some(ShaderObject {
                compiled: Some(Err(log)),
                ..
            }) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.state.borrow_mut().shaders.remove(&shader.0);
    }

    fn create_program(&self) -> ProgramHandle {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, ProgramObject::default());
        ProgramHandle(id)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(program) = self.state.borrow_mut().programs.get_mut(&program.0) {
            program.attached.push(shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let State {
            shaders, programs, ..
        } = &mut *state;
        if let Some(program) = programs.get_mut(&program.0) {
            program.linked = Some(link(shaders, &program.attached));
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state.borrow().linked(program).is_some()
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        match self.state.borrow().programs.get(&program.0) {
            Some(ProgramObject {
                linked: Some(Err(log)),
                ..
            }) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program.0);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.record(Call::UseProgram(program));
    }

    fn active_attribute_count(&self, program: ProgramHandle) -> u32 {
        self.state
            .borrow()
            .linked(program)
            .map_or(0, |linked| linked.attributes.len() as u32)
    }

    fn active_attribute(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let state = self.state.borrow();
        let attribute = state.linked(program)?.attributes.get(index as usize)?;
        Some(attribute.active.clone())
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        state
            .linked(program)?
            .attributes
            .iter()
            .find(|attribute| attribute.active.name == name)
            .map(|attribute| attribute.location)
    }

    fn active_uniform_count(&self, program: ProgramHandle) -> u32 {
        self.state
            .borrow()
            .linked(program)
            .map_or(0, |linked| linked.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let state = self.state.borrow();
        let uniform = state.linked(program)?.uniforms.get(index as usize)?;
        Some(uniform.active.clone())
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        state
            .linked(program)?
            .uniforms
            .iter()
            .find_map(|uniform| element_location(uniform, name))
            .map(UniformLocation)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        self.state
            .borrow_mut()
            .record(Call::BindArrayBuffer(buffer));
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: u8,
        base_type: BaseType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.state.borrow_mut().record(Call::VertexAttribPointer {
            location,
            size,
            base_type,
            normalized,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.state
            .borrow_mut()
            .record(Call::EnableVertexAttribArray(location));
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.active_texture = unit;
        state.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_texture;
        match texture {
            Some(texture) => state.bound_textures.insert((unit, target), texture),
            None => state.bound_textures.remove(&(unit, target)),
        };
        state.record(Call::BindTexture(target, texture));
    }

    fn uniform_f32(&self, location: UniformLocation, components: u8, values: &[f32]) {
        self.state.borrow_mut().record(Call::UniformF32 {
            location,
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_i32(&self, location: UniformLocation, components: u8, values: &[i32]) {
        self.state.borrow_mut().record(Call::UniformI32 {
            location,
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_matrix_f32(
        &self,
        location: UniformLocation,
        dimension: u8,
        transpose: bool,
        values: &[f32],
    ) {
        self.state.borrow_mut().record(Call::UniformMatrixF32 {
            location,
            dimension,
            transpose,
            values: values.to_vec(),
        });
    }
}
