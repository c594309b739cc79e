use crate::binding::Bound;
use crate::handle::{check_initialized, ObjectKind, Resource};
use crate::target::{BindableTo, BufferTarget, IndexedTarget};
use bytemuck::Pod;
use std::ops::Range;
use tracing::trace;

/// Usage hint of a buffer's storage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
    StreamRead,
    StaticCopy,
    DynamicCopy,
    StreamCopy,
}

impl Default for BufferUsage {
    fn default() -> Self {
        BufferUsage::StaticDraw
    }
}

/// Storage size and usage last specified for a buffer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BufferInfo {
    pub size: usize,
    pub usage: BufferUsage,
}

impl_resource_type!(
    /// Buffer objects.
    pub struct Buffer(BufferInfo) = ObjectKind::Buffer
);

impl<T: BufferTarget> BindableTo<T> for Buffer {}

impl<'a, T: BufferTarget> Bound<'a, Buffer, T> {
    /// Allocates uninitialized storage. Discards the previous contents.
    pub fn allocate(&self, size: usize, usage: BufferUsage) {
        if !check_initialized(Buffer::KIND, self.handle()) {
            return;
        }
        self.context().backend().buffer_data(T::ID, size, None, usage);
        self.resource().cell.set_meta(BufferInfo { size, usage });
    }

    /// Allocates storage for `data` and copies `data` into it.
    pub fn upload<D: Pod>(&self, data: &[D], usage: BufferUsage) {
        if !check_initialized(Buffer::KIND, self.handle()) {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        trace!(binding = ?T::ID, handle = %self.handle(), size = bytes.len(), "buffer upload");
        self.context()
            .backend()
            .buffer_data(T::ID, bytes.len(), Some(bytes), usage);
        self.resource().cell.set_meta(BufferInfo {
            size: bytes.len(),
            usage,
        });
    }

    /// Overwrites part of the storage, starting at `offset` bytes.
    pub fn update<D: Pod>(&self, offset: usize, data: &[D]) {
        if !check_initialized(Buffer::KIND, self.handle()) {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        debug_assert!(
            offset + bytes.len() <= self.size(),
            "buffer update out of bounds ({}+{} > {})",
            offset,
            bytes.len(),
            self.size()
        );
        self.context().backend().buffer_sub_data(T::ID, offset, bytes);
    }

    /// Size of the storage, in bytes.
    pub fn size(&self) -> usize {
        self.resource().cell.meta().size
    }
}

impl<'a, T: IndexedTarget> Bound<'a, Buffer, T> {
    /// Binds the whole buffer to the indexed binding point `index` of the target.
    pub fn bind_base(&self, index: u32) {
        if !check_initialized(Buffer::KIND, self.handle()) {
            return;
        }
        self.context()
            .backend()
            .bind_buffer_range(T::ID, index, self.handle(), None);
    }

    /// Binds a byte range of the buffer to the indexed binding point `index` of the target.
    ///
    /// Used to partition one buffer across several bindings.
    pub fn bind_range(&self, index: u32, range: Range<usize>) {
        if !check_initialized(Buffer::KIND, self.handle()) {
            return;
        }
        debug_assert!(
            range.start <= range.end && range.end <= self.size(),
            "buffer range {:?} out of bounds (size {})",
            range,
            self.size()
        );
        self.context()
            .backend()
            .bind_buffer_range(T::ID, index, self.handle(), Some(range));
    }
}
