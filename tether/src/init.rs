//! Initialization of aggregates of resources.
//!
//! Resources and locations are created uninitialized, usually as fields of one struct, and
//! initialized together once a context is available:
//!
//! ```
//! use tether::{Context, FragmentShader, Initialize, MockBackend, Program, UniformLocation, VertexShader};
//!
//! #[derive(Initialize)]
//! struct Pipeline {
//!     vs: VertexShader,
//!     fs: FragmentShader,
//!     program: Program,
//!     tint: UniformLocation<[f32; 4]>,
//! }
//!
//! impl Pipeline {
//!     fn new() -> Pipeline {
//!         let vs = VertexShader::new("in vec2 position;");
//!         let fs = FragmentShader::new("uniform vec4 tint;");
//!         let program = Program::new().attach(&vs).attach(&fs);
//!         let tint = UniformLocation::new(&program, "tint");
//!         Pipeline { vs, fs, program, tint }
//!     }
//! }
//!
//! let gl = Context::new(MockBackend::new());
//! let mut pipeline = Pipeline::new();
//! pipeline.initialize(&gl).unwrap();
//! assert!(pipeline.is_initialized());
//! ```
use crate::context::Context;
use crate::error::{Error, Result};
use std::borrow::Cow;
use tracing::{error, trace_span};

/// Objects that are created empty and initialized later against a context.
pub trait Initialize {
    /// Initializes the object. Does nothing if it's already initialized.
    ///
    /// On failure, the object stays uninitialized and the call can be retried.
    fn initialize(&mut self, gl: &Context) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// Name of the object in error reports.
    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

/// Optional members are initialized if present.
impl<T: Initialize> Initialize for Option<T> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        match self {
            Some(inner) => inner.initialize(gl),
            None => Ok(()),
        }
    }

    fn is_initialized(&self) -> bool {
        self.as_ref().map_or(true, Initialize::is_initialized)
    }

    fn describe(&self) -> Cow<'static, str> {
        match self {
            Some(inner) => inner.describe(),
            None => Cow::Borrowed("None"),
        }
    }
}

impl<T: Initialize + ?Sized> Initialize for Box<T> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        (**self).initialize(gl)
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn describe(&self) -> Cow<'static, str> {
        (**self).describe()
    }
}

/// Initializes each object in order, skipping those already initialized.
///
/// Stops at the first failure, leaving the remaining objects untouched, and returns an
/// `Error::Initialization` naming the failed object.
pub fn initialize_all(gl: &Context, objects: &mut [&mut dyn Initialize]) -> Result<()> {
    let span = trace_span!("initialize_all", count = objects.len());
    let _enter = span.enter();
    for (index, object) in objects.iter_mut().enumerate() {
        if object.is_initialized() {
            continue;
        }
        if let Err(err) = object.initialize(gl) {
            return Err(element_failed(index, object.describe(), err));
        }
    }
    Ok(())
}

/// Wraps the failure of one element of an aggregate.
///
/// Used by `#[derive(Initialize)]`.
#[doc(hidden)]
pub fn element_failed(index: usize, object: Cow<'static, str>, source: Error) -> Error {
    error!(index, %object, error = %source, "initialization failed");
    Error::Initialization {
        index,
        object,
        source: Box::new(source),
    }
}
