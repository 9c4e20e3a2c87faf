//! Type descriptors for reflected shader variables.
//!
//! Hosts report the type of every active variable as a token such as
//! `FLOAT_VEC3`, `FLOAT_MAT4` or `SAMPLER_CUBE`. The part before the first `_`
//! is the base type, the part after it (if any) the shape. Only the fixed set
//! below is supported; anything else is an error, never a silently skipped
//! variable.
//!
//! | token | base | category | arity |
//! |---|---|---|---|
//! | `FLOAT`, `INT`, `BOOL` | float/int/bool | scalar | 1 |
//! | `FLOAT_VEC{2,3,4}`, `INT_VEC{2,3,4}`, `BOOL_VEC{2,3,4}` | float/int/bool | vector | 2-4 |
//! | `FLOAT_MAT{2,3,4}` | float | matrix | 2-4 |
//! | `SAMPLER_2D` | sampler | 2D sampler | - |
//! | `SAMPLER_CUBE` | sampler | cube sampler | - |

use std::fmt;

use crate::error::ProgramError;

/// Scalar storage kind of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseType {
    Float,
    Int,
    Bool,
    Sampler,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Scalar,
    Vector,
    Matrix,
    Sampler2d,
    SamplerCube,
}

/// Structured form of a raw type token.
///
/// `arity` is the vector length or the matrix dimension, 1 for scalars and
/// `None` for samplers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub base_type: BaseType,
    pub category: Category,
    pub arity: Option<u8>,
}

impl TypeDescriptor {
    /// Number of scalar values one element of this type occupies in an upload.
    pub fn components(&self) -> usize {
        match (self.category, self.arity) {
            (Category::Matrix, Some(n)) => n as usize * n as usize,
            (_, Some(n)) => n as usize,
            (_, None) => 1,
        }
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self.category, Category::Sampler2d | Category::SamplerCube)
    }

    /// The raw token this descriptor was parsed from.
    pub fn token(&self) -> &'static str {
        use BaseType::*;
        use Category::*;
        match (self.base_type, self.category, self.arity) {
            (Float, Scalar, _) => "FLOAT",
            (Int, Scalar, _) => "INT",
            (Bool, Scalar, _) => "BOOL",
            (Float, Vector, Some(2)) => "FLOAT_VEC2",
            (Float, Vector, Some(3)) => "FLOAT_VEC3",
            (Float, Vector, _) => "FLOAT_VEC4",
            (Int, Vector, Some(2)) => "INT_VEC2",
            (Int, Vector, Some(3)) => "INT_VEC3",
            (Int, Vector, _) => "INT_VEC4",
            (Bool, Vector, Some(2)) => "BOOL_VEC2",
            (Bool, Vector, Some(3)) => "BOOL_VEC3",
            (Bool, Vector, _) => "BOOL_VEC4",
            (_, Matrix, Some(2)) => "FLOAT_MAT2",
            (_, Matrix, Some(3)) => "FLOAT_MAT3",
            (_, Matrix, _) => "FLOAT_MAT4",
            (_, Sampler2d, _) => "SAMPLER_2D",
            (_, SamplerCube, _) => "SAMPLER_CUBE",
            (Sampler, Scalar | Vector, _) => "SAMPLER",
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parse a raw type token into a [`TypeDescriptor`].
///
/// # Errors
///
/// [`ProgramError::UnsupportedType`] for any token outside the table in the
/// module documentation.
pub fn parse_type(token: &str) -> Result<TypeDescriptor, ProgramError> {
    let unsupported = || ProgramError::UnsupportedType {
        token: token.to_string(),
    };

    let (base, shape) = match token.split_once('_') {
        Some((base, shape)) => (base, Some(shape)),
        None => (token, None),
    };
    let base_type = match base {
        "FLOAT" => BaseType::Float,
        "INT" => BaseType::Int,
        "BOOL" => BaseType::Bool,
        "SAMPLER" => BaseType::Sampler,
        _ => return Err(unsupported()),
    };

    let Some(shape) = shape else {
        return match base_type {
            BaseType::Sampler => Err(unsupported()),
            _ => Ok(TypeDescriptor {
                base_type,
                category: Category::Scalar,
                arity: Some(1),
            }),
        };
    };

    let category = if shape.starts_with("VEC") {
        Category::Vector
    } else if shape.starts_with("MAT") {
        Category::Matrix
    } else if shape.starts_with("2D") {
        Category::Sampler2d
    } else if shape.starts_with("CUB") {
        Category::SamplerCube
    } else {
        return Err(unsupported());
    };

    let arity = match category {
        Category::Vector | Category::Matrix => match &shape[3..] {
            "2" => Some(2),
            "3" => Some(3),
            "4" => Some(4),
            _ => return Err(unsupported()),
        },
        Category::Sampler2d if shape == "2D" => None,
        Category::SamplerCube if shape == "CUBE" => None,
        _ => return Err(unsupported()),
    };

    let consistent = match category {
        Category::Vector => base_type != BaseType::Sampler,
        Category::Matrix => base_type == BaseType::Float,
        Category::Sampler2d | Category::SamplerCube => base_type == BaseType::Sampler,
        Category::Scalar => false,
    };
    if !consistent {
        return Err(unsupported());
    }

    Ok(TypeDescriptor {
        base_type,
        category,
        arity,
    })
}

/// Map a numeric GL type enum onto its token, for hosts that report types as numbers.
pub fn gl_enum_token(code: u32) -> Option<&'static str> {
    let token = match code {
        0x1406 => "FLOAT",
        0x8B50 => "FLOAT_VEC2",
        0x8B51 => "FLOAT_VEC3",
        0x8B52 => "FLOAT_VEC4",
        0x1404 => "INT",
        0x8B53 => "INT_VEC2",
        0x8B54 => "INT_VEC3",
        0x8B55 => "INT_VEC4",
        0x8B56 => "BOOL",
        0x8B57 => "BOOL_VEC2",
        0x8B58 => "BOOL_VEC3",
        0x8B59 => "BOOL_VEC4",
        0x8B5A => "FLOAT_MAT2",
        0x8B5B => "FLOAT_MAT3",
        0x8B5C => "FLOAT_MAT4",
        0x8B5E => "SAMPLER_2D",
        0x8B60 => "SAMPLER_CUBE",
        _ => return None,
    };
    Some(token)
}
