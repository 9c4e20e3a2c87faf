#![allow(dead_code)]

use flow_shader::{
    ActiveVariable, BaseType, BufferHandle, GraphicsContext, Program, ProgramError,
    ProgramHandle, ProgramOptions, ShaderHandle, ShaderSources, ShaderStage, TextureHandle,
    TextureTarget, UniformLocation, error::VariableKind, headless::HeadlessContext,
};

pub(crate) const TEXTURED_VERT: &str = include_str!("../shaders/textured.vert");
pub(crate) const TEXTURED_FRAG: &str = include_str!("../shaders/textured.frag");
pub(crate) const LIT_VERT: &str = include_str!("../shaders/lit.vert");
pub(crate) const LIT_FRAG: &str = include_str!("../shaders/lit.frag");
pub(crate) const BROKEN_FRAG: &str = include_str!("../shaders/broken.frag");

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn textured() -> ShaderSources {
    ShaderSources::new(TEXTURED_VERT, TEXTURED_FRAG)
}

pub(crate) fn lit() -> ShaderSources {
    ShaderSources::new(LIT_VERT, LIT_FRAG)
}

/// Build `sources` on a fresh headless context and make the program current.
pub(crate) fn build(
    sources: &ShaderSources,
    options: ProgramOptions,
) -> Result<(HeadlessContext, Program), ProgramError> {
    init_logger();
    let ctx = HeadlessContext::new();
    let program = Program::with_options(&ctx, sources, options)?;
    program.bind(&ctx);
    ctx.take_calls();
    Ok((ctx, program))
}

/// Texture units of every sampler uniform, ordered by uniform location.
pub(crate) fn sampler_units(program: &Program) -> Vec<(String, u32)> {
    let mut samplers: Vec<_> = program
        .uniforms()
        .filter_map(|uniform| {
            uniform
                .texture_unit
                .map(|unit| (uniform.location.0, uniform.name.clone(), unit))
        })
        .collect();
    samplers.sort();
    samplers
        .into_iter()
        .map(|(_, name, unit)| (name, unit))
        .collect()
}

/// A [`GraphicsContext`] over a [`HeadlessContext`] that misbehaves the way
/// real drivers do: extra active variables without a location (built-ins,
/// uniform block members) and variables that cannot be queried.
pub(crate) struct QuirkyContext<'a> {
    pub inner: &'a HeadlessContext,
    pub extra_attributes: Vec<ActiveVariable>,
    pub extra_uniforms: Vec<ActiveVariable>,
    pub unqueryable: Option<(VariableKind, u32)>,
}

impl<'a> QuirkyContext<'a> {
    pub(crate) fn new(inner: &'a HeadlessContext) -> Self {
        Self {
            inner,
            extra_attributes: Vec::new(),
            extra_uniforms: Vec::new(),
            unqueryable: None,
        }
    }

    pub(crate) fn with_attribute(mut self, name: &str, type_token: &str) -> Self {
        self.extra_attributes.push(active(name, type_token));
        self
    }

    pub(crate) fn with_uniform(mut self, name: &str, type_token: &str) -> Self {
        self.extra_uniforms.push(active(name, type_token));
        self
    }

    pub(crate) fn unqueryable(mut self, kind: VariableKind, index: u32) -> Self {
        self.unqueryable = Some((kind, index));
        self
    }

    fn query(
        &self,
        kind: VariableKind,
        index: u32,
        count: u32,
        extras: &[ActiveVariable],
        lookup: impl FnOnce() -> Option<ActiveVariable>,
    ) -> Option<ActiveVariable> {
        if self.unqueryable == Some((kind, index)) {
            return None;
        }
        if index < count {
            lookup()
        } else {
            extras.get((index - count) as usize).cloned()
        }
    }
}

fn active(name: &str, type_token: &str) -> ActiveVariable {
    ActiveVariable {
        name: name.to_string(),
        type_token: type_token.to_string(),
        size: 1,
    }
}

impl GraphicsContext for QuirkyContext<'_> {
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        self.inner.create_shader(stage)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        self.inner.shader_source(shader, source)
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        self.inner.compile_shader(shader)
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.inner.shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.inner.shader_info_log(shader)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.inner.delete_shader(shader)
    }

    fn create_program(&self) -> ProgramHandle {
        self.inner.create_program()
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        self.inner.attach_shader(program, shader)
    }

    fn link_program(&self, program: ProgramHandle) {
        self.inner.link_program(program)
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.inner.program_link_status(program)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.inner.program_info_log(program)
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.inner.delete_program(program)
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.inner.use_program(program)
    }

    fn active_attribute_count(&self, program: ProgramHandle) -> u32 {
        self.inner.active_attribute_count(program) + self.extra_attributes.len() as u32
    }

    fn active_attribute(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let count = self.inner.active_attribute_count(program);
        self.query(VariableKind::Attribute, index, count, &self.extra_attributes, || {
            self.inner.active_attribute(program, index)
        })
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.inner.attribute_location(program, name)
    }

    fn active_uniform_count(&self, program: ProgramHandle) -> u32 {
        self.inner.active_uniform_count(program) + self.extra_uniforms.len() as u32
    }

    fn active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable> {
        let count = self.inner.active_uniform_count(program);
        self.query(VariableKind::Uniform, index, count, &self.extra_uniforms, || {
            self.inner.active_uniform(program, index)
        })
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.inner.uniform_location(program, name)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        self.inner.bind_array_buffer(buffer)
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
        self.inner
            .vertex_attrib_pointer(location, size, base_type, normalized, stride, offset)
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.inner.enable_vertex_attrib_array(location)
    }

    fn active_texture(&self, unit: u32) {
        self.inner.active_texture(unit)
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.inner.bind_texture(target, texture)
    }

    fn uniform_f32(&self, location: UniformLocation, components: u8, values: &[f32]) {
        self.inner.uniform_f32(location, components, values)
    }

    fn uniform_i32(&self, location: UniformLocation, components: u8, values: &[i32]) {
        self.inner.uniform_i32(location, components, values)
    }

    fn uniform_matrix_f32(
        &self,
        location: UniformLocation,
        dimension: u8,
        transpose: bool,
        values: &[f32],
    ) {
        self.inner
            .uniform_matrix_f32(location, dimension, transpose, values)
    }
}
