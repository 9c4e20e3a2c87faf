//! Host graphics context.
//!
//! [`GraphicsContext`] is the capability set a program needs from the GPU API:
//! shader and program objects, reflection queries, vertex input setup, texture
//! units and uniform uploads. Nothing in this crate reaches a graphics context
//! through global state; every operation receives the context it runs against.
//!
//! Handles are opaque ids minted by the context. They are plain `Copy` values
//! and carry no ownership on their own: a [`Program`](crate::Program) owns its
//! [`ProgramHandle`], while buffers and textures stay owned by the caller.

use std::fmt;

use crate::program::types::BaseType;

/// A compiled (or failed) shader stage object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// A linked program object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// A vertex buffer owned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// A 2D or cube-map texture owned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Location of a uniform inside one linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Texture binding point on a texture unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2d,
    CubeMap,
}

/// Per-index metadata of an active attribute or uniform as reported by the host.
///
/// `type_token` is the raw type token (`FLOAT_VEC3`, `SAMPLER_CUBE`, ...).
/// `size` is the array length; 1 for non-array variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    pub type_token: String,
    pub size: u32,
}

/// The capability set a [`Program`](crate::Program) drives.
///
/// The methods mirror the GL family of APIs closely so that a thin wrapper over
/// a real GL/WebGL binding is enough to implement it. All methods take `&self`:
/// graphics contexts are single-threaded command streams and implementations
/// keep whatever bookkeeping they need behind interior mutability.
pub trait GraphicsContext {
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> ProgramHandle;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: Option<ProgramHandle>);

    fn active_attribute_count(&self, program: ProgramHandle) -> u32;
    fn active_attribute(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable>;
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    fn active_uniform_count(&self, program: ProgramHandle) -> u32;
    fn active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveVariable>;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>);
    /// Describe the vertex input at `location`.
    ///
    /// # Arguments
    ///
    /// * `size` is the number of components per vertex (1 to 4)
    /// * `base_type` is the component type
    /// * `stride` and `offset` are in bytes, relative to the bound array buffer
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: u8,
        base_type: BaseType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, location: u32);

    /// Select texture unit `unit` (0-based) for subsequent [`bind_texture`](Self::bind_texture) calls.
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>);

    /// Upload `values` as float vectors with `components` elements each.
    fn uniform_f32(&self, location: UniformLocation, components: u8, values: &[f32]);
    /// Upload `values` as integer vectors with `components` elements each.
    fn uniform_i32(&self, location: UniformLocation, components: u8, values: &[i32]);
    /// Upload `values` as column-major square matrices of `dimension` x `dimension`.
    fn uniform_matrix_f32(
        &self,
        location: UniformLocation,
        dimension: u8,
        transpose: bool,
        values: &[f32],
    );
}
