//! Shaders and programs.
//!
//! Initializing a shader compiles it; initializing a program links the shaders attached to
//! it, which must be initialized first. `initialize_all` (or `#[derive(Initialize)]`) over
//! an aggregate that declares shaders before the program takes care of the order.
use crate::context::Context;
use crate::error::{BuildStage, Error, Result};
use crate::handle::{Handle, NativeHandle, ObjectCell, ObjectData, ObjectKind, Resource};
use crate::init::Initialize;
use crate::sealed::Sealed;
use crate::target::{BindableTo, CurrentProgram};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, error};

/// Shader stages.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Compute => "compute",
        })
    }
}

/// Stage markers for `Shader<S>`.
pub mod stage {
    use super::ShaderStage;
    use crate::sealed::Sealed;

    pub trait Stage: Sealed + 'static {
        const STAGE: ShaderStage;
    }

    macro_rules! stages {
        ($($name:ident),*) => {
            $(
                #[derive(Copy, Clone, Debug)]
                pub struct $name;
                impl Sealed for $name {}
                impl Stage for $name {
                    const STAGE: ShaderStage = ShaderStage::$name;
                }
            )*
        };
    }

    stages!(Vertex, Fragment, Geometry, TessControl, TessEvaluation, Compute);
}

use self::stage::Stage;

/// Compilation state of a shader.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ShaderInfo {
    /// Length in bytes of the compiled source.
    pub source_len: usize,
}

/// Shader objects, typed by stage.
pub struct Shader<S: Stage> {
    pub(crate) cell: Rc<ObjectCell<ShaderInfo>>,
    source: Rc<str>,
    _stage: PhantomData<S>,
}

pub type VertexShader = Shader<stage::Vertex>;
pub type FragmentShader = Shader<stage::Fragment>;
pub type GeometryShader = Shader<stage::Geometry>;
pub type TessControlShader = Shader<stage::TessControl>;
pub type TessEvaluationShader = Shader<stage::TessEvaluation>;
pub type ComputeShader = Shader<stage::Compute>;

impl<S: Stage> Shader<S> {
    /// Creates an uninitialized shader with the given source. Nothing is compiled until
    /// `initialize`.
    pub fn new(source: impl Into<Rc<str>>) -> Shader<S> {
        Shader {
            cell: Default::default(),
            source: source.into(),
            _stage: PhantomData,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stage(&self) -> ShaderStage {
        S::STAGE
    }

    /// Allocates and compiles the shader. Does nothing if it's already initialized.
    ///
    /// On failure, the shader object is deleted and the error carries the compilation log.
    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        let kind = ObjectKind::Shader(S::STAGE);
        let source = &self.source;
        self.cell
            .get_or_try_init(|| {
                let native = NativeHandle::generate(gl, kind)?;
                if let Err(log) = gl.backend().compile_shader(native.handle(), source) {
                    error!(stage = %S::STAGE, %log, "shader compilation failed");
                    return Err(Error::LinkOrCompileFailed {
                        stage: BuildStage::Compile(S::STAGE),
                        log,
                    });
                }
                debug!(stage = %S::STAGE, handle = %native.handle(), "compiled shader");
                Ok(native)
            })?;
        self.cell.set_meta(ShaderInfo {
            source_len: self.source.len(),
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.is_initialized()
    }

    pub fn handle(&self) -> Handle {
        self.cell.handle()
    }

    pub fn data(&self) -> ObjectData<ShaderInfo> {
        self.cell.data()
    }
}

impl<S: Stage> Default for Shader<S> {
    fn default() -> Self {
        Shader::new("")
    }
}

impl<S: Stage> Clone for Shader<S> {
    fn clone(&self) -> Self {
        Shader {
            cell: self.cell.clone(),
            source: self.source.clone(),
            _stage: PhantomData,
        }
    }
}

impl<S: Stage> fmt::Debug for Shader<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Shader")
            .field("stage", &S::STAGE)
            .field("handle", &self.cell.handle())
            .finish()
    }
}

impl<S: Stage> Sealed for Shader<S> {}

impl<S: Stage> Resource for Shader<S> {
    const KIND: ObjectKind = ObjectKind::Shader(S::STAGE);

    fn handle(&self) -> Handle {
        self.cell.handle()
    }
}

impl<S: Stage> Initialize for Shader<S> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        Shader::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        Shader::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{} shader", S::STAGE))
    }
}

//--------------------------------------------------------------------------------------------------

/// Link state of a program.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ProgramInfo {
    /// Number of shaders linked into the program.
    pub shader_count: u32,
}

#[derive(Clone)]
struct AttachedShader {
    stage: ShaderStage,
    cell: Rc<ObjectCell<ShaderInfo>>,
}

/// Program objects.
///
/// Attached shaders are kept alive for as long as the program.
#[derive(Clone, Default)]
pub struct Program {
    pub(crate) cell: Rc<ObjectCell<ProgramInfo>>,
    shaders: Vec<AttachedShader>,
}

impl Program {
    /// Creates an uninitialized program with no shaders attached.
    pub fn new() -> Program {
        Default::default()
    }

    /// Attaches a shader. The shader doesn't need to be initialized yet, only by the time the
    /// program is.
    pub fn attach<S: Stage>(mut self, shader: &Shader<S>) -> Program {
        self.attach_shader(shader);
        self
    }

    pub fn attach_shader<S: Stage>(&mut self, shader: &Shader<S>) {
        debug_assert!(!self.is_initialized(), "attaching a shader to an already linked program");
        self.shaders.push(AttachedShader {
            stage: S::STAGE,
            cell: shader.cell.clone(),
        });
    }

    /// Links the program. Does nothing if it's already initialized.
    ///
    /// Fails with `NotInitialized` if one of the attached shaders isn't compiled.
    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let mut handles = Vec::with_capacity(self.shaders.len());
        for shader in self.shaders.iter() {
            if !shader.cell.is_initialized() {
                return Err(Error::NotInitialized {
                    kind: ObjectKind::Shader(shader.stage),
                });
            }
            handles.push(shader.cell.handle());
        }
        self.cell.get_or_try_init(|| {
            let native = NativeHandle::generate(gl, ObjectKind::Program)?;
            if let Err(log) = gl.backend().link_program(native.handle(), &handles) {
                error!(%log, "program link failed");
                return Err(Error::LinkOrCompileFailed {
                    stage: BuildStage::Link,
                    log,
                });
            }
            debug!(handle = %native.handle(), shaders = handles.len(), "linked program");
            Ok(native)
        })?;
        self.cell.set_meta(ProgramInfo {
            shader_count: handles.len() as u32,
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.is_initialized()
    }

    pub fn handle(&self) -> Handle {
        self.cell.handle()
    }

    pub fn data(&self) -> ObjectData<ProgramInfo> {
        self.cell.data()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.cell.handle())
            .field(
                "shaders",
                &self.shaders.iter().map(|s| (s.stage, s.cell.handle())).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Sealed for Program {}

impl Resource for Program {
    const KIND: ObjectKind = ObjectKind::Program;

    fn handle(&self) -> Handle {
        self.cell.handle()
    }
}

impl BindableTo<CurrentProgram> for Program {}

impl Initialize for Program {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        Program::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        Program::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed("Program")
    }
}
