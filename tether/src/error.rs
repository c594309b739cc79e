use crate::framebuffer::FramebufferStatus;
use crate::handle::ObjectKind;
use crate::shader::ShaderStage;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// What a failed name lookup was looking for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LocationKind {
    Uniform,
    Attribute,
    UniformBlock,
    StorageBlock,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LocationKind::Uniform => f.write_str("uniform"),
            LocationKind::Attribute => f.write_str("vertex attribute"),
            LocationKind::UniformBlock => f.write_str("uniform block"),
            LocationKind::StorageBlock => f.write_str("shader storage block"),
        }
    }
}

/// The step of program construction that failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BuildStage {
    Compile(ShaderStage),
    Link,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildStage::Compile(stage) => write!(f, "{} shader compilation", stage),
            BuildStage::Link => f.write_str("program link"),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The backend returned the null handle when asked for a new object.
    #[error("the backend refused to allocate a {kind} object")]
    AllocationFailed { kind: ObjectKind },

    /// The operation needs an initialized object.
    #[error("operation on an uninitialized {kind} object")]
    NotInitialized { kind: ObjectKind },

    /// Name lookup against a linked program failed.
    #[error("{kind} `{name}` not found in program")]
    LocationNotFound { name: String, kind: LocationKind },

    /// Shader compilation or program link failed. Contains the backend log.
    #[error("{stage} failed:\n{log}")]
    LinkOrCompileFailed { stage: BuildStage, log: String },

    #[error("framebuffer incomplete: {0:?}")]
    FramebufferIncomplete(FramebufferStatus),

    /// The program a location refers to has been dropped.
    #[error("`{name}` refers to a program that no longer exists")]
    DanglingProgram { name: String },

    /// An element of an aggregate failed to initialize.
    #[error("failed to initialize {object} (element {index})")]
    Initialization {
        index: usize,
        object: Cow<'static, str>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, looking through nested `Initialization` errors.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Initialization { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
