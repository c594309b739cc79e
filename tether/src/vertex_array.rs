//! Vertex arrays and attribute locations.
//!
//! The element array buffer binding is part of the vertex array state: bind the index buffer
//! with `RestorePolicy::DoNothing` while the vertex array is bound, or the index buffer
//! guard will unbind it from the vertex array when dropped.
use crate::binding::Bound;
use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{LocationKind, Result};
use crate::handle::{check_initialized, ObjectKind, Resource};
use crate::init::Initialize;
use crate::shader::Program;
use crate::target::{ArrayBuffer, BindableTo, CurrentVertexArray};
use crate::uniform::ProgramLocation;
use crate::vertex::VertexAttribute;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

/// Maximum number of vertex attributes tracked by `VertexArrayInfo`.
pub const MAX_VERTEX_ATTRIBUTES: u32 = 32;

/// Vertex attributes enabled on a vertex array.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct VertexArrayInfo {
    /// Bit `i` is set if attribute `i` is enabled.
    pub enabled: u32,
}

impl_resource_type!(
    /// Vertex array objects.
    pub struct VertexArray(VertexArrayInfo) = ObjectKind::VertexArray
);

impl BindableTo<CurrentVertexArray> for VertexArray {}

/// Location of a vertex attribute of type `A` in a program.
pub struct AttributeLocation<A> {
    inner: ProgramLocation,
    _type: PhantomData<fn(A)>,
}

impl<A: VertexAttribute> AttributeLocation<A> {
    /// Creates an unresolved location. `program` does not need to be initialized yet.
    pub fn new(program: &Program, name: impl Into<Cow<'static, str>>) -> AttributeLocation<A> {
        AttributeLocation {
            inner: ProgramLocation::new(program, name.into()),
            _type: PhantomData,
        }
    }

    /// Looks up the attribute in the program. Does nothing if it's already resolved.
    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        self.inner.resolve(gl, LocationKind::Attribute, |gl, program, name| {
            gl.backend().attribute_location(program, name)
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_resolved()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn index(&self) -> Option<u32> {
        self.inner.index()
    }
}

impl<A> Clone for AttributeLocation<A> {
    fn clone(&self) -> Self {
        AttributeLocation {
            inner: self.inner.clone(),
            _type: PhantomData,
        }
    }
}

impl<A> fmt::Debug for AttributeLocation<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("AttributeLocation").field(&self.inner).finish()
    }
}

impl<A: VertexAttribute> Initialize for AttributeLocation<A> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        AttributeLocation::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        AttributeLocation::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("attribute `{}`", self.inner.name()))
    }
}

impl<'a> Bound<'a, VertexArray, CurrentVertexArray> {
    /// Sources an attribute from the bound array buffer and enables it.
    ///
    /// `stride` and `offset` are in bytes.
    pub fn attribute<A: VertexAttribute>(
        &self,
        location: &AttributeLocation<A>,
        buffer: &Bound<Buffer, ArrayBuffer>,
        stride: usize,
        offset: usize,
    ) {
        let index = match location.index() {
            Some(index) => index,
            None => {
                debug_assert!(false, "attribute `{}` used before initialization", location.name());
                return;
            }
        };
        self.attribute_at::<A>(index, buffer, stride, offset)
    }

    /// Same as `attribute`, with an explicit attribute index (`layout(location = N)`).
    pub fn attribute_at<A: VertexAttribute>(
        &self,
        index: u32,
        buffer: &Bound<Buffer, ArrayBuffer>,
        stride: usize,
        offset: usize,
    ) {
        if !check_initialized(VertexArray::KIND, self.handle()) {
            return;
        }
        if !check_initialized(Buffer::KIND, buffer.handle()) {
            return;
        }
        debug_assert!(index < MAX_VERTEX_ATTRIBUTES);
        trace!(vertex_array = %self.handle(), index, format = ?A::FORMAT, stride, offset, buffer = %buffer.handle(), "vertex attribute");
        let backend = self.context().backend();
        backend.vertex_attrib_pointer(index, A::FORMAT, stride, offset);
        backend.enable_vertex_attrib(index, true);
        self.resource().cell.update_meta(|info| info.enabled |= 1 << index);
    }

    pub fn disable<A: VertexAttribute>(&self, location: &AttributeLocation<A>) {
        if !check_initialized(VertexArray::KIND, self.handle()) {
            return;
        }
        if let Some(index) = location.index() {
            self.context().backend().enable_vertex_attrib(index, false);
            self.resource().cell.update_meta(|info| info.enabled &= !(1 << index));
        }
    }

    /// Advances the attribute once every `divisor` instances instead of once per vertex.
    /// `0` restores per-vertex advancing.
    pub fn divisor<A: VertexAttribute>(&self, location: &AttributeLocation<A>, divisor: u32) {
        if !check_initialized(VertexArray::KIND, self.handle()) {
            return;
        }
        match location.index() {
            Some(index) => self.context().backend().vertex_attrib_divisor(index, divisor),
            None => debug_assert!(false, "attribute `{}` used before initialization", location.name()),
        }
    }
}
