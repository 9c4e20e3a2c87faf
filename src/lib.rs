//! flow-shader
//!
//! Shader program reflection and dispatch for small real-time renderers. A
//! [`Program`] is built once from a vertex and a fragment source: both stages
//! are compiled, linked, and the linked program is reflected into two
//! name-indexed tables (uniforms and attributes). Per-frame code then sets
//! uniforms and binds vertex buffers by name without knowing which GPU call
//! each variable needs.
//!
//! High-level modules
//! - `context`: the host capability set ([`GraphicsContext`]) and opaque GPU handles
//! - `error`: the construction and dispatch error taxonomy
//! - `program`: compile, link, reflect, and the uniform/attribute dispatchers
//! - `headless`: a GPU-free [`GraphicsContext`] used for tests and tooling
//!

pub mod context;
pub mod error;
pub mod headless;
pub mod program;

// Re-exports commonly used types for convenience in downstream code.
pub use context::{
    ActiveVariable, BufferHandle, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage,
    TextureHandle, TextureTarget, UniformLocation,
};
pub use error::ProgramError;
pub use program::{
    MissingNamePolicy, Program, ProgramOptions, ShaderSources,
    reflect::{AttributeBinding, UniformBinding},
    types::{BaseType, Category, TypeDescriptor, parse_type},
    uniform::UniformValue,
};
