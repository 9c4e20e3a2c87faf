//! Uniform values and upload dispatch.
//!
//! Every uniform binding carries an [`UniformUpload`] tag decided once during
//! reflection. Setting a value is a single match over that tag and the shape of
//! the [`UniformValue`]; no call signature is derived at runtime.

use crate::{
    context::{GraphicsContext, TextureHandle, TextureTarget},
    error::ProgramError,
    program::{
        reflect::UniformBinding,
        types::{BaseType, Category, TypeDescriptor},
    },
};

/// A value that can be handed to [`Program::set_uniform`](crate::Program::set_uniform).
///
/// Numeric buffers are flat: a `vec3` takes 3 values, a `mat4` 16 values in
/// column-major order, an array of N `vec3`s up to `3 * N` values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue<'a> {
    Texture(TextureHandle),
    Floats(&'a [f32]),
    Ints(&'a [i32]),
}

impl UniformValue<'_> {
    fn describe(&self) -> &'static str {
        match self {
            UniformValue::Texture(_) => "a texture",
            UniformValue::Floats(_) => "float values",
            UniformValue::Ints(_) => "integer values",
        }
    }
}

impl From<TextureHandle> for UniformValue<'_> {
    fn from(texture: TextureHandle) -> Self {
        UniformValue::Texture(texture)
    }
}

impl<'a> From<&'a [f32]> for UniformValue<'a> {
    fn from(values: &'a [f32]) -> Self {
        UniformValue::Floats(values)
    }
}

impl<'a, const N: usize> From<&'a [f32; N]> for UniformValue<'a> {
    fn from(values: &'a [f32; N]) -> Self {
        UniformValue::Floats(values)
    }
}

impl<'a> From<&'a [i32]> for UniformValue<'a> {
    fn from(values: &'a [i32]) -> Self {
        UniformValue::Ints(values)
    }
}

impl<'a, const N: usize> From<&'a [i32; N]> for UniformValue<'a> {
    fn from(values: &'a [i32; N]) -> Self {
        UniformValue::Ints(values)
    }
}

// Square matrices and runs of vectors are flattened without copying.
macro_rules! impl_flattened_floats {
    ($($n:literal),+) => {$(
        impl<'a> From<&'a [[f32; $n]; $n]> for UniformValue<'a> {
            fn from(matrix: &'a [[f32; $n]; $n]) -> Self {
                UniformValue::Floats(bytemuck::cast_slice(&matrix[..]))
            }
        }

        impl<'a> From<&'a [[f32; $n]]> for UniformValue<'a> {
            fn from(vectors: &'a [[f32; $n]]) -> Self {
                UniformValue::Floats(bytemuck::cast_slice(vectors))
            }
        }
    )+};
}
impl_flattened_floats!(2, 3, 4);

macro_rules! impl_cgmath {
    ($($vector:ident, $matrix:ident, $n:literal);+) => {$(
        impl<'a> From<&'a cgmath::$vector<f32>> for UniformValue<'a> {
            fn from(vector: &'a cgmath::$vector<f32>) -> Self {
                UniformValue::Floats(AsRef::<[f32; $n]>::as_ref(vector))
            }
        }

        impl<'a> From<&'a cgmath::$matrix<f32>> for UniformValue<'a> {
            fn from(matrix: &'a cgmath::$matrix<f32>) -> Self {
                let columns: &'a [[f32; $n]; $n] = matrix.as_ref();
                UniformValue::Floats(bytemuck::cast_slice(&columns[..]))
            }
        }
    )+};
}
impl_cgmath!(Vector2, Matrix2, 2; Vector3, Matrix3, 3; Vector4, Matrix4, 4);

/// Which upload call a uniform needs, with its component count or texture unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UniformUpload {
    Float(u8),
    Int(u8),
    Matrix(u8),
    Texture { target: TextureTarget, unit: u32 },
}

impl UniformUpload {
    /// Decide the upload call for a reflected uniform.
    ///
    /// Scalars go through the vector path with one component and booleans
    /// through the integer path. A sampler without a texture unit is a
    /// reflection bug and reported as [`ProgramError::UnsupportedType`].
    pub(crate) fn resolve(
        descriptor: &TypeDescriptor,
        texture_unit: Option<u32>,
        token: &str,
    ) -> Result<Self, ProgramError> {
        let upload = match (descriptor.category, descriptor.arity, texture_unit) {
            (Category::Scalar | Category::Vector, Some(n), None) => match descriptor.base_type {
                BaseType::Float => UniformUpload::Float(n),
                BaseType::Int | BaseType::Bool => UniformUpload::Int(n),
                BaseType::Sampler => return Err(unsupported(token)),
            },
            (Category::Matrix, Some(n), None) => UniformUpload::Matrix(n),
            (Category::Sampler2d, None, Some(unit)) => UniformUpload::Texture {
                target: TextureTarget::Texture2d,
                unit,
            },
            (Category::SamplerCube, None, Some(unit)) => UniformUpload::Texture {
                target: TextureTarget::CubeMap,
                unit,
            },
            _ => return Err(unsupported(token)),
        };
        Ok(upload)
    }

    fn expects(&self) -> &'static str {
        match self {
            UniformUpload::Float(_) | UniformUpload::Matrix(_) => "float values",
            UniformUpload::Int(_) => "integer values",
            UniformUpload::Texture { .. } => "a texture",
        }
    }
}

fn unsupported(token: &str) -> ProgramError {
    ProgramError::UnsupportedType {
        token: token.to_string(),
    }
}

fn check_len(binding: &UniformBinding, len: usize) -> Result<(), ProgramError> {
    let components = binding.descriptor.components();
    let elements = len / components;
    if len == 0 || len % components != 0 || elements > binding.size as usize {
        return Err(ProgramError::ValueLength {
            name: binding.name.clone(),
            components,
            max_elements: binding.size,
            len,
        });
    }
    Ok(())
}

/// Upload `value` into the uniform described by `binding`.
///
/// Samplers take the two-step route the GPU binding model requires: the
/// texture is bound to the uniform's own unit and the uniform receives the
/// unit index, never the texture handle.
pub(crate) fn dispatch<C: GraphicsContext + ?Sized>(
    ctx: &C,
    binding: &UniformBinding,
    value: UniformValue<'_>,
) -> Result<(), ProgramError> {
    match (binding.upload, value) {
        (UniformUpload::Float(components), UniformValue::Floats(values)) => {
            check_len(binding, values.len())?;
            ctx.uniform_f32(binding.location, components, values);
        }
        (UniformUpload::Int(components), UniformValue::Ints(values)) => {
            check_len(binding, values.len())?;
            ctx.uniform_i32(binding.location, components, values);
        }
        (UniformUpload::Matrix(dimension), UniformValue::Floats(values)) => {
            check_len(binding, values.len())?;
            ctx.uniform_matrix_f32(binding.location, dimension, false, values);
        }
        (UniformUpload::Texture { target, unit }, UniformValue::Texture(texture)) => {
            ctx.active_texture(unit);
            ctx.bind_texture(target, Some(texture));
            ctx.uniform_i32(binding.location, 1, &[unit as i32]);
        }
        (upload, value) => {
            return Err(ProgramError::ValueMismatch {
                name: binding.name.clone(),
                expected: upload.expects(),
                found: value.describe(),
            });
        }
    }
    Ok(())
}
