//! Errors raised while building a program or dispatching values into it.

use std::fmt;

use thiserror::Error;

use crate::context::ShaderStage;

/// Which reflection table a variable belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Attribute,
    Uniform,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Attribute => f.write_str("attribute"),
            VariableKind::Uniform => f.write_str("uniform"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// A shader stage was rejected by the compiler. `log` is the compiler's diagnostic output.
    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("failed to link program: {log}")]
    Link { log: String },

    /// The host reported a variable type outside the supported token set.
    #[error("unsupported shader variable type `{token}`")]
    UnsupportedType { token: String },

    /// The host listed an active variable it then could not describe.
    #[error("active {kind} {index} could not be queried")]
    Query { kind: VariableKind, index: u32 },

    /// Only returned under [`MissingNamePolicy::Strict`](crate::MissingNamePolicy::Strict).
    #[error("no active uniform named `{0}`")]
    UnknownUniform(String),

    /// Only returned under [`MissingNamePolicy::Strict`](crate::MissingNamePolicy::Strict).
    #[error("no active attribute named `{0}`")]
    UnknownAttribute(String),

    #[error("uniform `{name}` expects {expected} but was given {found}")]
    ValueMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(
        "uniform `{name}` takes between 1 and {max_elements} elements of {components} values, got {len} values"
    )]
    ValueLength {
        name: String,
        components: usize,
        max_elements: u32,
        len: usize,
    },
}
