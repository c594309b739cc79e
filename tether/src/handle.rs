//! Native object handles and the shared cells that own them.
use crate::context::Context;
use crate::error::{Error, Result};
use crate::sealed::Sealed;
use crate::shader::ShaderStage;
use crate::target::TargetClass;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::fmt;
use tracing::{debug, warn};

/// Opaque identifier of a backend object. `Handle::NULL` is the "no object" value of every target.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle(pub u32);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Kinds of backend objects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    Buffer,
    Texture,
    Framebuffer,
    Renderbuffer,
    VertexArray,
    Program,
    Shader(ShaderStage),
}

impl ObjectKind {
    /// The kind of target objects of this kind are bound to. Shaders are never bound.
    pub fn target_class(self) -> Option<TargetClass> {
        match self {
            ObjectKind::Buffer => Some(TargetClass::Buffer),
            ObjectKind::Texture => Some(TargetClass::Texture),
            ObjectKind::Framebuffer => Some(TargetClass::Framebuffer),
            ObjectKind::Renderbuffer => Some(TargetClass::Renderbuffer),
            ObjectKind::VertexArray => Some(TargetClass::VertexArray),
            ObjectKind::Program => Some(TargetClass::Program),
            ObjectKind::Shader(_) => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObjectKind::Buffer => f.write_str("buffer"),
            ObjectKind::Texture => f.write_str("texture"),
            ObjectKind::Framebuffer => f.write_str("framebuffer"),
            ObjectKind::Renderbuffer => f.write_str("renderbuffer"),
            ObjectKind::VertexArray => f.write_str("vertex array"),
            ObjectKind::Program => f.write_str("program"),
            ObjectKind::Shader(stage) => write!(f, "{} shader", stage),
        }
    }
}

/// Owns a backend object. Deletes it on drop.
///
/// This keeps a reference to the context, so the backend outlives every object created from it.
pub(crate) struct NativeHandle {
    gl: Context,
    kind: ObjectKind,
    obj: Handle,
}

impl NativeHandle {
    pub(crate) fn generate(gl: &Context, kind: ObjectKind) -> Result<NativeHandle> {
        let obj = gl.backend().generate(kind);
        if obj.is_null() {
            warn!(%kind, "backend refused to allocate an object");
            return Err(Error::AllocationFailed { kind });
        }
        debug!(%kind, handle = obj.0, "created object");
        Ok(NativeHandle {
            gl: gl.clone(),
            kind,
            obj,
        })
    }

    pub(crate) fn handle(&self) -> Handle {
        self.obj
    }

    pub(crate) fn context(&self) -> &Context {
        &self.gl
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        debug!(kind = %self.kind, handle = self.obj.0, "deleting object");
        self.gl.forget_object(self.kind, self.obj);
        self.gl.backend().delete(self.kind, self.obj)
    }
}

/// Backend object shared by every copy of a resource wrapper, plus metadata cached
/// at the last mutating call.
///
/// The metadata is informational: it mirrors what was last sent to the backend and is never
/// read back from it.
pub(crate) struct ObjectCell<M> {
    native: OnceCell<NativeHandle>,
    meta: Cell<M>,
}

impl<M: Copy + Default> Default for ObjectCell<M> {
    fn default() -> Self {
        ObjectCell {
            native: OnceCell::new(),
            meta: Cell::new(M::default()),
        }
    }
}

impl<M: Copy> ObjectCell<M> {
    pub(crate) fn handle(&self) -> Handle {
        self.native.get().map_or(Handle::NULL, NativeHandle::handle)
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.native.get().is_some()
    }

    pub(crate) fn context(&self) -> Option<&Context> {
        self.native.get().map(NativeHandle::context)
    }

    /// Allocates the native object with `create` unless it already exists.
    ///
    /// If `create` fails, the cell stays empty.
    pub(crate) fn get_or_try_init(&self, create: impl FnOnce() -> Result<NativeHandle>) -> Result<Handle> {
        self.native.get_or_try_init(create).map(NativeHandle::handle)
    }

    pub(crate) fn meta(&self) -> M {
        self.meta.get()
    }

    pub(crate) fn set_meta(&self, meta: M) {
        self.meta.set(meta)
    }

    pub(crate) fn update_meta(&self, f: impl FnOnce(&mut M)) {
        let mut meta = self.meta.get();
        f(&mut meta);
        self.meta.set(meta);
    }

    pub(crate) fn data(&self) -> ObjectData<M> {
        ObjectData {
            handle: self.handle(),
            meta: self.meta(),
        }
    }
}

/// Read-only view of a resource: its handle and the cached metadata.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ObjectData<M> {
    pub handle: Handle,
    pub meta: M,
}

/// Trait implemented by resource wrappers.
pub trait Resource: Sealed {
    /// Kind of the backend object.
    const KIND: ObjectKind;

    /// Returns the native handle, `Handle::NULL` if the resource is not initialized.
    fn handle(&self) -> Handle;
}

/// Checks that an operation that needs a live object received one.
///
/// Panics in debug builds. In release builds, returns false and the caller skips the operation.
pub(crate) fn check_initialized(kind: ObjectKind, handle: Handle) -> bool {
    debug_assert!(!handle.is_null(), "{}", Error::NotInitialized { kind });
    !handle.is_null()
}

macro_rules! impl_resource_type {
    ($(#[$m:meta])* $v:vis struct $name:ident($meta:ty) = $kind:expr) => {
        $(#[$m])*
        #[derive(Clone, Default)]
        $v struct $name {
            pub(crate) cell: std::rc::Rc<crate::handle::ObjectCell<$meta>>,
        }

        impl $name {
            /// Creates a new, uninitialized object.
            $v fn new() -> $name {
                Default::default()
            }

            /// Allocates the native object. Does nothing if it's already initialized.
            $v fn initialize(&mut self, gl: &crate::context::Context) -> crate::error::Result<()> {
                self.cell
                    .get_or_try_init(|| crate::handle::NativeHandle::generate(gl, $kind))
                    .map(drop)
            }

            $v fn is_initialized(&self) -> bool {
                self.cell.is_initialized()
            }

            $v fn handle(&self) -> crate::handle::Handle {
                self.cell.handle()
            }

            /// Returns the handle and the metadata cached at the last mutating call.
            $v fn data(&self) -> crate::handle::ObjectData<$meta> {
                self.cell.data()
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("handle", &self.cell.handle())
                    .field("meta", &self.cell.meta())
                    .finish()
            }
        }

        impl crate::sealed::Sealed for $name {}

        impl crate::handle::Resource for $name {
            const KIND: crate::handle::ObjectKind = $kind;

            fn handle(&self) -> crate::handle::Handle {
                self.cell.handle()
            }
        }

        impl crate::init::Initialize for $name {
            fn initialize(&mut self, gl: &crate::context::Context) -> crate::error::Result<()> {
                $name::initialize(self, gl)
            }

            fn is_initialized(&self) -> bool {
                $name::is_initialized(self)
            }

            fn describe(&self) -> std::borrow::Cow<'static, str> {
                std::borrow::Cow::Borrowed(stringify!($name))
            }
        }
    };
}
