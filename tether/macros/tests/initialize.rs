use tether::{
    Buffer, Context, Error, FragmentShader, Initialize, MockBackend, ObjectKind, Program, Texture2d,
    UniformLocation, VertexArray, VertexShader,
};

#[derive(Initialize)]
struct Pipeline {
    vs: VertexShader,
    fs: FragmentShader,
    program: Program,
    #[init(name = "tint color")]
    tint: UniformLocation<[f32; 4]>,
    vertex_array: VertexArray,
}

impl Pipeline {
    fn new(fragment: &'static str) -> Pipeline {
        let vs = VertexShader::new("in vec2 position;");
        let fs = FragmentShader::new(fragment);
        let program = Program::new().attach(&vs).attach(&fs);
        let tint = UniformLocation::new(&program, "tint");
        Pipeline {
            vs,
            fs,
            program,
            tint,
            vertex_array: VertexArray::new(),
        }
    }
}

#[derive(Initialize)]
struct Targets(Texture2d, #[init(skip)] Texture2d, Option<Buffer>);

#[derive(Initialize)]
struct Frame {
    pipeline: Pipeline,
    targets: Targets,
    #[init(skip)]
    frame_count: u64,
}

#[derive(Initialize)]
struct Passes {
    #[init(skip)]
    scratch: Texture2d,
    #[init(skip)]
    history: Texture2d,
    blur: Texture2d,
    output: Buffer,
}

#[test]
fn fields_are_initialized_in_order() {
    let mock = MockBackend::new();
    let gl = Context::new(mock.clone());
    let mut pipeline = Pipeline::new("uniform vec4 tint;");
    assert!(!pipeline.is_initialized());
    pipeline.initialize(&gl).unwrap();
    assert!(pipeline.is_initialized());
    assert!(pipeline.program.is_initialized());
    assert_eq!(pipeline.tint.index(), Some(0));
    assert_eq!(pipeline.describe(), "Pipeline");

    // idempotent
    pipeline.initialize(&gl).unwrap();
    assert_eq!(mock.generated(ObjectKind::Program), 1);
}

#[test]
fn failure_names_the_field() {
    let gl = Context::new(MockBackend::new());
    let mut pipeline = Pipeline::new("uniform vec4 color;");
    match pipeline.initialize(&gl) {
        Err(Error::Initialization { index, object, source }) => {
            assert_eq!(index, 3);
            assert_eq!(object, "tint color");
            assert!(matches!(*source, Error::LocationNotFound { .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(pipeline.program.is_initialized());
    assert!(!pipeline.vertex_array.is_initialized());
}

#[test]
fn tuple_structs_and_skipped_fields() {
    let mock = MockBackend::new();
    let gl = Context::new(mock.clone());
    let mut targets = Targets(Texture2d::new(), Texture2d::new(), Some(Buffer::new()));
    targets.initialize(&gl).unwrap();
    assert!(targets.is_initialized());
    assert!(targets.0.is_initialized());
    assert!(!targets.1.is_initialized());
    assert_eq!(mock.generated(ObjectKind::Texture), 1);
    assert_eq!(mock.generated(ObjectKind::Buffer), 1);
}

#[test]
fn nested_aggregates() {
    let mock = MockBackend::new();
    let gl = Context::new(mock.clone());
    mock.fail_generate(ObjectKind::Texture);
    let mut frame = Frame {
        pipeline: Pipeline::new("uniform vec4 tint;"),
        targets: Targets(Texture2d::new(), Texture2d::new(), None),
        frame_count: 0,
    };
    let err = frame.initialize(&gl).unwrap_err();
    match &err {
        Error::Initialization { index, object, source } => {
            assert_eq!((*index, &**object), (1, "targets"));
            assert!(matches!(**source, Error::Initialization { index: 0, .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(
        err.root_cause(),
        Error::AllocationFailed {
            kind: ObjectKind::Texture
        }
    ));
    assert!(frame.pipeline.is_initialized());

    mock.allow_generate(ObjectKind::Texture);
    frame.initialize(&gl).unwrap();
    assert!(frame.is_initialized());
    assert_eq!(frame.frame_count, 0);
}

#[test]
fn reported_index_ignores_skipped_fields() {
    let mock = MockBackend::new();
    let gl = Context::new(mock.clone());
    mock.fail_generate(ObjectKind::Buffer);
    let mut passes = Passes {
        scratch: Texture2d::new(),
        history: Texture2d::new(),
        blur: Texture2d::new(),
        output: Buffer::new(),
    };
    match passes.initialize(&gl) {
        Err(Error::Initialization { index, object, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(object, "output");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(passes.blur.is_initialized());
    assert!(!passes.scratch.is_initialized());
    assert!(!passes.history.is_initialized());
}
