//! Shader programs.
//!
//! A [`Program`] is built exactly once from a [`ShaderSources`] pair:
//! compile both stages, link, and reflect the active attributes and uniforms
//! into name-indexed tables. Afterwards the tables are immutable; per-frame code
//! only sets uniforms and binds attributes through them.
//!
//! ```no_run
//! # use flow_shader::{GraphicsContext, Program, ShaderSources, TextureHandle, BufferHandle};
//! # fn frame(ctx: &impl GraphicsContext, vertex: &str, fragment: &str, projection: &[[f32; 4]; 4], texture: TextureHandle, vbo: BufferHandle) -> Result<(), flow_shader::ProgramError> {
//! let program = Program::new(ctx, &ShaderSources::new(vertex, fragment))?;
//! program.bind(ctx);
//! program.set_uniform(ctx, "uPMatrix", projection)?;
//! program.set_uniform(ctx, "uSampler", texture)?;
//! program.set_attribute(ctx, "aPosition", vbo, 20, 0)?;
//! program.set_attribute(ctx, "aUV", vbo, 20, 12)?;
//! program.destroy(ctx);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use crate::{
    context::{BufferHandle, GraphicsContext, ProgramHandle},
    error::ProgramError,
};

pub mod attribute;
pub mod compile;
pub mod layout;
pub mod reflect;
pub mod types;
pub mod uniform;

use layout::VertexLayout;
use reflect::{AttributeBinding, UniformBinding};
use uniform::UniformValue;

/// Vertex and fragment source text for one program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// What happens when a uniform or attribute name is not in the program's tables.
///
/// Compilers drop variables a shader variant never reads, so callers routinely
/// address names that are not active. `Lenient` treats that as a no-op (with a
/// debug log line); `Strict` reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingNamePolicy {
    #[default]
    Lenient,
    Strict,
}

/// Per-program configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramOptions {
    pub label: Option<String>,
    pub missing_names: MissingNamePolicy,
}

impl ProgramOptions {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn missing_names(mut self, policy: MissingNamePolicy) -> Self {
        self.missing_names = policy;
        self
    }

    pub fn strict(self) -> Self {
        self.missing_names(MissingNamePolicy::Strict)
    }
}

/// A linked shader program with its reflected uniform and attribute tables.
///
/// The program exclusively owns its GPU program object. It does not hold on to
/// the context: every operation receives the context it was built with.
#[derive(Debug)]
pub struct Program {
    handle: ProgramHandle,
    options: ProgramOptions,
    uniforms: HashMap<String, UniformBinding>,
    attributes: HashMap<String, AttributeBinding>,
}

impl Program {
    /// Compile, link and reflect `sources` with default options.
    ///
    /// # Errors
    ///
    /// * [`ProgramError::Compile`] if either stage is rejected
    /// * [`ProgramError::Link`] if the stages do not link
    /// * [`ProgramError::UnsupportedType`] if an active variable has an unsupported type
    /// * [`ProgramError::Query`] if the host cannot describe one of its active variables
    ///
    /// A failed build leaves no shader or program object behind.
    pub fn new<C: GraphicsContext + ?Sized>(
        ctx: &C,
        sources: &ShaderSources,
    ) -> Result<Self, ProgramError> {
        Self::with_options(ctx, sources, ProgramOptions::default())
    }

    pub fn with_options<C: GraphicsContext + ?Sized>(
        ctx: &C,
        sources: &ShaderSources,
        options: ProgramOptions,
    ) -> Result<Self, ProgramError> {
        let reflection = reflect::build(ctx, sources)?;
        log::debug!(
            "Linked program {} ({:?}): {} attributes, {} uniforms, {} texture units",
            options.label.as_deref().unwrap_or("<unlabeled>"),
            reflection.program,
            reflection.attributes.len(),
            reflection.uniforms.len(),
            reflection.texture_units,
        );
        Ok(Self {
            handle: reflection.program,
            options,
            uniforms: reflection.uniforms,
            attributes: reflection.attributes,
        })
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn label(&self) -> Option<&str> {
        self.options.label.as_deref()
    }

    pub fn options(&self) -> &ProgramOptions {
        &self.options
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformBinding> {
        self.uniforms.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeBinding> {
        self.attributes.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &UniformBinding> {
        self.uniforms.values()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeBinding> {
        self.attributes.values()
    }

    /// Interleaved vertex layout covering every active attribute.
    pub fn vertex_layout(&self) -> Result<VertexLayout, ProgramError> {
        VertexLayout::from_bindings(self.attributes.values())
    }

    /// Make this program current so uniform uploads land in it.
    pub fn bind<C: GraphicsContext + ?Sized>(&self, ctx: &C) {
        ctx.use_program(Some(self.handle));
    }

    /// Set the uniform `name` to `value`.
    ///
    /// Samplers take a [`TextureHandle`](crate::TextureHandle), everything
    /// else a flat numeric buffer (see [`UniformValue`]). The program must be
    /// current (see [`bind`](Self::bind)).
    ///
    /// An unknown `name` is a no-op under [`MissingNamePolicy::Lenient`] and
    /// [`ProgramError::UnknownUniform`] under [`MissingNamePolicy::Strict`].
    /// A value that does not fit the uniform is reported as
    /// [`ProgramError::ValueMismatch`] or [`ProgramError::ValueLength`] and
    /// nothing is uploaded.
    pub fn set_uniform<'v, C: GraphicsContext + ?Sized>(
        &self,
        ctx: &C,
        name: &str,
        value: impl Into<UniformValue<'v>>,
    ) -> Result<(), ProgramError> {
        let Some(binding) = self.uniforms.get(name) else {
            return self.missing(ProgramError::UnknownUniform(name.to_string()));
        };
        uniform::dispatch(ctx, binding, value.into())
    }

    /// Source the attribute `name` from `buffer`.
    ///
    /// `stride` and `offset` are in bytes. Unknown names follow the program's
    /// [`MissingNamePolicy`] like [`set_uniform`](Self::set_uniform).
    pub fn set_attribute<C: GraphicsContext + ?Sized>(
        &self,
        ctx: &C,
        name: &str,
        buffer: BufferHandle,
        stride: i32,
        offset: i32,
    ) -> Result<(), ProgramError> {
        let Some(binding) = self.attributes.get(name) else {
            return self.missing(ProgramError::UnknownAttribute(name.to_string()));
        };
        attribute::bind(ctx, binding, buffer, stride, offset);
        Ok(())
    }

    /// Release the GPU program object.
    ///
    /// Shader stage objects were already released after linking; buffers and
    /// textures belong to the caller and are left alone.
    pub fn destroy<C: GraphicsContext + ?Sized>(self, ctx: &C) {
        log::debug!(
            "Destroying program {} ({:?})",
            self.label().unwrap_or("<unlabeled>"),
            self.handle
        );
        ctx.delete_program(self.handle);
    }

    fn missing(&self, error: ProgramError) -> Result<(), ProgramError> {
        match self.options.missing_names {
            MissingNamePolicy::Lenient => {
                log::debug!(
                    "Program {}: {error}, ignoring",
                    self.label().unwrap_or("<unlabeled>")
                );
                Ok(())
            }
            MissingNamePolicy::Strict => Err(error),
        }
    }
}
