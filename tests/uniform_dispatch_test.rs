mod common;

use cgmath::SquareMatrix;
use common::test_utils::{build, lit, textured};
use flow_shader::{
    MissingNamePolicy, ProgramError, ProgramOptions, TextureTarget, UniformLocation, UniformValue,
    headless::Call,
};

#[test]
fn should_upload_matrices_without_transpose() -> anyhow::Result<()> {
    let (ctx, program) = build(&textured(), ProgramOptions::default())?;
    let projection = cgmath::perspective(cgmath::Deg(45.0f32), 1.5, 0.1, 100.0);

    program.set_uniform(&ctx, "uPMatrix", &projection)?;

    let expected: &[[f32; 4]; 4] = projection.as_ref();
    assert_eq!(
        ctx.take_calls(),
        vec![Call::UniformMatrixF32 {
            location: UniformLocation(0),
            dimension: 4,
            transpose: false,
            values: expected.iter().flatten().copied().collect(),
        }]
    );
    Ok(())
}

#[test]
fn should_bind_texture_to_unit_and_upload_unit_index() -> anyhow::Result<()> {
    let (ctx, program) = build(&textured(), ProgramOptions::default())?;
    let texture = ctx.create_texture();

    program.set_uniform(&ctx, "uSampler", texture)?;

    assert_eq!(
        ctx.take_calls(),
        vec![
            Call::ActiveTexture(1),
            Call::BindTexture(TextureTarget::Texture2d, Some(texture)),
            Call::UniformI32 {
                location: UniformLocation(1),
                components: 1,
                values: vec![1],
            },
        ]
    );
    assert_eq!(ctx.bound_texture(1, TextureTarget::Texture2d), Some(texture));
    Ok(())
}

#[test]
fn should_bind_cube_maps_on_their_own_unit() -> anyhow::Result<()> {
    let (ctx, program) = build(&lit(), ProgramOptions::default())?;
    let diffuse = ctx.create_texture();
    let environment = ctx.create_texture();

    program.set_uniform(&ctx, "uDiffuse", diffuse)?;
    program.set_uniform(&ctx, "uEnvironment", environment)?;

    assert_eq!(ctx.bound_texture(1, TextureTarget::Texture2d), Some(diffuse));
    assert_eq!(ctx.bound_texture(2, TextureTarget::CubeMap), Some(environment));
    let unit_uploads: Vec<_> = ctx
        .take_calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::UniformI32 { values, .. } => Some(values),
            _ => None,
        })
        .collect();
    assert_eq!(unit_uploads, vec![vec![1], vec![2]]);
    Ok(())
}

#[test]
fn should_dispatch_vectors_by_base_type_and_arity() -> anyhow::Result<()> {
    let (ctx, program) = build(&lit(), ProgramOptions::default())?;
    let location = |name: &str| program.uniform(name).map(|u| u.location).unwrap();

    program.set_uniform(&ctx, "uExposure", &[1.25f32])?;
    program.set_uniform(&ctx, "uLightCount", &[2i32])?;
    program.set_uniform(&ctx, "uUseShadows", &[1i32])?;
    program.set_uniform(&ctx, "uFlags", &[1i32, 0])?;

    assert_eq!(
        ctx.take_calls(),
        vec![
            Call::UniformF32 {
                location: location("uExposure"),
                components: 1,
                values: vec![1.25],
            },
            Call::UniformI32 {
                location: location("uLightCount"),
                components: 1,
                values: vec![2],
            },
            Call::UniformI32 {
                location: location("uUseShadows"),
                components: 1,
                values: vec![1],
            },
            Call::UniformI32 {
                location: location("uFlags"),
                components: 2,
                values: vec![1, 0],
            },
        ]
    );
    Ok(())
}

#[test]
fn should_upload_partial_and_full_arrays() -> anyhow::Result<()> {
    let (ctx, program) = build(&lit(), ProgramOptions::default())?;
    let directions: Vec<[f32; 3]> = vec![[0.0, -1.0, 0.0], [1.0, 0.0, 0.0]];

    program.set_uniform(&ctx, "uLightDirections", &directions[..])?;

    assert_eq!(
        ctx.take_calls(),
        vec![Call::UniformF32 {
            location: program.uniform("uLightDirections").unwrap().location,
            components: 3,
            values: vec![0.0, -1.0, 0.0, 1.0, 0.0, 0.0],
        }]
    );

    let too_many = [[0.0f32; 3]; 5];
    assert_eq!(
        program.set_uniform(&ctx, "uLightDirections", &too_many[..]),
        Err(ProgramError::ValueLength {
            name: "uLightDirections".to_string(),
            components: 3,
            max_elements: 4,
            len: 15,
        })
    );
    assert!(ctx.take_calls().is_empty());
    Ok(())
}

#[test]
fn should_ignore_unknown_uniforms_by_default() -> anyhow::Result<()> {
    let (ctx, program) = build(&lit(), ProgramOptions::default())?;
    let texture = ctx.create_texture();

    // uTint is declared but optimized away
    program.set_uniform(&ctx, "uTint", &[1.0f32, 1.0, 1.0, 1.0])?;
    program.set_uniform(&ctx, "uNoSuchUniform", texture)?;
    program.set_uniform(&ctx, "uLightDirections[0]", &[0.0f32, 1.0, 0.0])?;

    assert!(ctx.calls().is_empty());
    Ok(())
}

#[test]
fn should_report_unknown_uniforms_in_strict_mode() -> anyhow::Result<()> {
    let (ctx, program) = build(
        &lit(),
        ProgramOptions::default()
            .label("lit")
            .missing_names(MissingNamePolicy::Strict),
    )?;

    assert_eq!(
        program.set_uniform(&ctx, "uTint", &[1.0f32, 1.0, 1.0, 1.0]),
        Err(ProgramError::UnknownUniform("uTint".to_string()))
    );
    assert_eq!(program.label(), Some("lit"));
    assert!(ctx.calls().is_empty());
    Ok(())
}

#[test]
fn should_reject_values_of_the_wrong_shape() -> anyhow::Result<()> {
    let (ctx, program) = build(&textured(), ProgramOptions::default())?;
    let texture = ctx.create_texture();

    assert_eq!(
        program.set_uniform(&ctx, "uPMatrix", texture),
        Err(ProgramError::ValueMismatch {
            name: "uPMatrix".to_string(),
            expected: "float values",
            found: "a texture",
        })
    );
    assert_eq!(
        program.set_uniform(&ctx, "uSampler", UniformValue::Ints(&[3])),
        Err(ProgramError::ValueMismatch {
            name: "uSampler".to_string(),
            expected: "a texture",
            found: "integer values",
        })
    );
    assert!(matches!(
        program.set_uniform(&ctx, "uPMatrix", &[1.0f32; 9]),
        Err(ProgramError::ValueLength { len: 9, .. })
    ));
    assert!(ctx.calls().is_empty());
    Ok(())
}

#[test]
fn should_accept_cgmath_identity_for_normal_matrix() -> anyhow::Result<()> {
    let (ctx, program) = build(&lit(), ProgramOptions::default())?;

    program.set_uniform(&ctx, "uNMatrix", &cgmath::Matrix3::<f32>::identity())?;

    assert_eq!(
        ctx.take_calls(),
        vec![Call::UniformMatrixF32 {
            location: program.uniform("uNMatrix").unwrap().location,
            dimension: 3,
            transpose: false,
            values: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }]
    );
    Ok(())
}
