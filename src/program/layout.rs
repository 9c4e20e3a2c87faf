//! Vertex layouts derived from reflected attributes.
//!
//! A [`VertexLayout`] packs every active attribute of a program into a single
//! interleaved vertex, ordered by shader location. It can be handed to a wgpu
//! pipeline as a [`wgpu::VertexBufferLayout`] or used to compute the stride and
//! offsets for [`Program::set_attribute`](crate::Program::set_attribute).

use crate::{
    error::ProgramError,
    program::{
        reflect::AttributeBinding,
        types::{BaseType, Category, TypeDescriptor},
    },
};

#[derive(Clone, Debug, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<wgpu::VertexAttribute>,
    array_stride: wgpu::BufferAddress,
}

impl VertexLayout {
    /// Pack `bindings` tightly in ascending location order.
    ///
    /// # Errors
    ///
    /// [`ProgramError::UnsupportedType`] if an attribute has no vertex format
    /// (booleans, matrices and samplers).
    pub fn from_bindings<'a>(
        bindings: impl IntoIterator<Item = &'a AttributeBinding>,
    ) -> Result<Self, ProgramError> {
        let mut bindings: Vec<&AttributeBinding> = bindings.into_iter().collect();
        bindings.sort_by_key(|binding| binding.location);

        let mut attributes = Vec::with_capacity(bindings.len());
        let mut offset = 0;
        for binding in bindings {
            let format = vertex_format(&binding.descriptor).ok_or_else(|| {
                ProgramError::UnsupportedType {
                    token: binding.descriptor.token().to_string(),
                }
            })?;
            attributes.push(wgpu::VertexAttribute {
                format,
                offset,
                shader_location: binding.location,
            });
            offset += (binding.descriptor.components() * 4) as wgpu::BufferAddress;
        }

        Ok(Self {
            attributes,
            array_stride: offset,
        })
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    /// Size of one packed vertex in bytes.
    pub fn array_stride(&self) -> wgpu::BufferAddress {
        self.array_stride
    }

    /// Byte offset of the attribute at `location` inside a packed vertex.
    pub fn offset_of(&self, location: u32) -> Option<wgpu::BufferAddress> {
        self.attributes
            .iter()
            .find(|attribute| attribute.shader_location == location)
            .map(|attribute| attribute.offset)
    }

    pub fn buffer_layout(&self, step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode,
            attributes: &self.attributes,
        }
    }
}

fn vertex_format(descriptor: &TypeDescriptor) -> Option<wgpu::VertexFormat> {
    let format = match (descriptor.base_type, descriptor.category, descriptor.arity) {
        (BaseType::Float, Category::Scalar, _) => wgpu::VertexFormat::Float32,
        (BaseType::Float, Category::Vector, Some(2)) => wgpu::VertexFormat::Float32x2,
        (BaseType::Float, Category::Vector, Some(3)) => wgpu::VertexFormat::Float32x3,
        (BaseType::Float, Category::Vector, Some(4)) => wgpu::VertexFormat::Float32x4,
        (BaseType::Int, Category::Scalar, _) => wgpu::VertexFormat::Sint32,
        (BaseType::Int, Category::Vector, Some(2)) => wgpu::VertexFormat::Sint32x2,
        (BaseType::Int, Category::Vector, Some(3)) => wgpu::VertexFormat::Sint32x3,
        (BaseType::Int, Category::Vector, Some(4)) => wgpu::VertexFormat::Sint32x4,
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::types::parse_type;

    fn attribute(name: &str, token: &str, location: u32) -> AttributeBinding {
        AttributeBinding {
            name: name.to_string(),
            descriptor: parse_type(token).unwrap(),
            location,
            size: 1,
        }
    }

    #[test]
    fn packs_attributes_in_location_order() {
        let bindings = [
            attribute("aUV", "FLOAT_VEC2", 1),
            attribute("aPosition", "FLOAT_VEC3", 0),
            attribute("aBone", "INT", 2),
        ];
        let layout = VertexLayout::from_bindings(&bindings).unwrap();

        assert_eq!(layout.array_stride(), 24);
        assert_eq!(
            layout.attributes(),
            &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 12,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Sint32,
                    offset: 20,
                    shader_location: 2,
                },
            ]
        );
        assert_eq!(layout.offset_of(1), Some(12));
        assert_eq!(layout.offset_of(7), None);

        let buffer_layout = layout.buffer_layout(wgpu::VertexStepMode::Vertex);
        assert_eq!(buffer_layout.array_stride, 24);
        assert_eq!(buffer_layout.attributes.len(), 3);
    }

    #[test]
    fn matrices_have_no_vertex_format() {
        let bindings = [attribute("aModel", "FLOAT_MAT4", 0)];
        assert_eq!(
            VertexLayout::from_bindings(&bindings),
            Err(ProgramError::UnsupportedType {
                token: "FLOAT_MAT4".to_string()
            })
        );
    }
}
