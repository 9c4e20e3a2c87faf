use crate::{
    context::{BufferHandle, GraphicsContext},
    program::reflect::AttributeBinding,
};

/// Point the attribute at `buffer` and enable it for the next draw call.
///
/// `stride` and `offset` are in bytes. Attributes are never normalized.
pub(crate) fn bind<C: GraphicsContext + ?Sized>(
    ctx: &C,
    binding: &AttributeBinding,
    buffer: BufferHandle,
    stride: i32,
    offset: i32,
) {
    let components = binding.descriptor.arity.unwrap_or(1);
    ctx.bind_array_buffer(Some(buffer));
    ctx.vertex_attrib_pointer(
        binding.location,
        components,
        binding.descriptor.base_type,
        false,
        stride,
        offset,
    );
    ctx.enable_vertex_attrib_array(binding.location);
}
