use crate::{
    context::{GraphicsContext, ShaderHandle, ShaderStage},
    error::ProgramError,
};

/// Compile one shader stage.
///
/// On failure the shader object is released again and the compiler's
/// diagnostic log is returned inside [`ProgramError::Compile`]. On success the
/// caller owns the returned handle and is responsible for deleting it once the
/// program has been linked.
pub fn compile<C: GraphicsContext + ?Sized>(
    ctx: &C,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderHandle, ProgramError> {
    let shader = ctx.create_shader(stage);
    ctx.shader_source(shader, source);
    ctx.compile_shader(shader);

    if !ctx.shader_compile_status(shader) {
        let log = ctx.shader_info_log(shader);
        ctx.delete_shader(shader);
        log::error!("The {stage} shader failed to compile:\n{log}");
        return Err(ProgramError::Compile { stage, log });
    }
    Ok(shader)
}
