mod common;

use common::Fixture;
use tether::{
    initialize_all, BuildStage, Buffer, Error, FragmentShader, Initialize, ObjectKind, Program, ShaderStage,
    Texture2d, UniformLocation, VertexShader,
};

#[test]
fn initialize_all_is_idempotent() {
    let fx = Fixture::new();
    let mut buffer = Buffer::new();
    let mut texture = Texture2d::new();
    initialize_all(&fx.gl, &mut [&mut buffer, &mut texture]).unwrap();
    initialize_all(&fx.gl, &mut [&mut buffer, &mut texture]).unwrap();
    assert!(buffer.is_initialized());
    assert!(texture.is_initialized());
    assert_eq!(fx.mock.generated(ObjectKind::Buffer), 1);
    assert_eq!(fx.mock.generated(ObjectKind::Texture), 1);
}

#[test]
fn initialize_all_stops_at_first_failure() {
    let fx = Fixture::new();
    let mut first = Buffer::new();
    let mut broken = VertexShader::new("#error broken on purpose");
    let mut last = Buffer::new();

    let err = initialize_all(&fx.gl, &mut [&mut first, &mut broken, &mut last]).unwrap_err();
    match &err {
        Error::Initialization { index, object, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(object, "vertex shader");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(
        err.root_cause(),
        Error::LinkOrCompileFailed {
            stage: BuildStage::Compile(ShaderStage::Vertex),
            ..
        }
    ));
    assert!(first.is_initialized());
    assert!(!broken.is_initialized());
    assert!(!last.is_initialized());
    assert_eq!(fx.mock.generated(ObjectKind::Buffer), 1);
}

#[test]
fn failed_initialization_can_be_retried() {
    let fx = Fixture::new();
    let mut first = Buffer::new();
    let mut texture = Texture2d::new();
    fx.mock.fail_generate(ObjectKind::Texture);
    assert!(initialize_all(&fx.gl, &mut [&mut first, &mut texture]).is_err());
    fx.mock.allow_generate(ObjectKind::Texture);
    initialize_all(&fx.gl, &mut [&mut first, &mut texture]).unwrap();
    assert_eq!(fx.mock.generated(ObjectKind::Buffer), 1);
    assert!(texture.is_initialized());
}

#[test]
fn optional_members() {
    let fx = Fixture::new();
    let mut present: Option<Buffer> = Some(Buffer::new());
    let mut absent: Option<Buffer> = None;
    assert!(!present.is_initialized());
    assert!(absent.is_initialized());
    initialize_all(&fx.gl, &mut [&mut present, &mut absent]).unwrap();
    assert!(present.as_ref().unwrap().is_initialized());
}

#[test]
fn pipeline_in_dependency_order() {
    let fx = Fixture::new();
    let mut vs = VertexShader::new("in vec3 position;\nuniform mat4 transform;");
    let mut fs = FragmentShader::new("uniform vec4 tint;");
    let mut program = Program::new().attach(&vs).attach(&fs);
    let mut transform = UniformLocation::<[[f32; 4]; 4]>::new(&program, "transform");
    let mut color = UniformLocation::<[f32; 4]>::new(&program, "color");

    let err = initialize_all(
        &fx.gl,
        &mut [&mut vs, &mut fs, &mut program, &mut transform, &mut color],
    )
    .unwrap_err();
    match err {
        Error::Initialization { index, ref object, .. } => {
            assert_eq!(index, 4);
            assert_eq!(object, "uniform `color`");
        }
        ref other => panic!("unexpected error: {:?}", other),
    }
    assert!(program.is_initialized());
    assert!(transform.is_initialized());
}
