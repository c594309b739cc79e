//! Draw calls.
//!
//! Draws take the guards of the program and vertex array they use (and of the index buffer,
//! for indexed draws), so they can't be issued against a stale binding.
use crate::binding::Bound;
use crate::buffer::Buffer;
use crate::handle::{check_initialized, ObjectKind};
use crate::sealed::SealedIndex;
use crate::shader::Program;
use crate::target::{CurrentProgram, CurrentVertexArray, ElementArrayBuffer};
use crate::vertex_array::VertexArray;
use std::mem;
use tracing::trace;

/// Primitive topologies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Patches,
}

/// Describes the type of indices contained in an index buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IndexFormat {
    /// 8-bit unsigned integer indices
    U8,
    /// 16-bit unsigned integer indices
    U16,
    /// 32-bit unsigned integer indices
    U32,
}

impl IndexFormat {
    pub fn byte_size(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// Trait implemented by types that can serve as indices.
///
/// # Safety
///
/// `FORMAT` must match the size of the type.
pub unsafe trait IndexType: SealedIndex + bytemuck::Pod {
    const FORMAT: IndexFormat;
}

macro_rules! impl_index_type {
    ($t:ty, $fmt:ident) => {
        impl SealedIndex for $t {}
        unsafe impl IndexType for $t {
            const FORMAT: IndexFormat = IndexFormat::$fmt;
        }
    };
}

impl_index_type!(u8, U8);
impl_index_type!(u16, U16);
impl_index_type!(u32, U32);

fn check_draw(program: &Bound<Program, CurrentProgram>, vertex_array: &Bound<VertexArray, CurrentVertexArray>) -> bool {
    debug_assert!(
        program.context().same_context(vertex_array.context()),
        "program and vertex array bound on different contexts"
    );
    check_initialized(ObjectKind::Program, program.handle())
        && check_initialized(ObjectKind::VertexArray, vertex_array.handle())
}

/// Draws `count` vertices starting at `first`. Does nothing if `count <= 0`.
pub fn draw(
    program: &Bound<Program, CurrentProgram>,
    vertex_array: &Bound<VertexArray, CurrentVertexArray>,
    mode: Primitive,
    first: i32,
    count: i32,
) {
    if count <= 0 || !check_draw(program, vertex_array) {
        return;
    }
    trace!(?mode, first, count, "draw");
    program.context().backend().draw_arrays(mode, first, count, None);
}

/// Draws `instances` instances of `count` vertices. Does nothing if `count <= 0` or
/// `instances <= 0`.
pub fn draw_instanced(
    program: &Bound<Program, CurrentProgram>,
    vertex_array: &Bound<VertexArray, CurrentVertexArray>,
    mode: Primitive,
    first: i32,
    count: i32,
    instances: i32,
) {
    if count <= 0 || instances <= 0 || !check_draw(program, vertex_array) {
        return;
    }
    trace!(?mode, first, count, instances, "draw instanced");
    program
        .context()
        .backend()
        .draw_arrays(mode, first, count, Some(instances));
}

/// Draws `count` indices of type `I`, starting at index `first`, from the bound index buffer.
/// Does nothing if `count <= 0`.
pub fn draw_indexed<I: IndexType>(
    program: &Bound<Program, CurrentProgram>,
    vertex_array: &Bound<VertexArray, CurrentVertexArray>,
    indices: &Bound<Buffer, ElementArrayBuffer>,
    mode: Primitive,
    first: usize,
    count: i32,
) {
    draw_elements::<I>(program, vertex_array, indices, mode, first, count, None)
}

/// Instanced variant of `draw_indexed`. Does nothing if `count <= 0` or `instances <= 0`.
pub fn draw_indexed_instanced<I: IndexType>(
    program: &Bound<Program, CurrentProgram>,
    vertex_array: &Bound<VertexArray, CurrentVertexArray>,
    indices: &Bound<Buffer, ElementArrayBuffer>,
    mode: Primitive,
    first: usize,
    count: i32,
    instances: i32,
) {
    if instances <= 0 {
        return;
    }
    draw_elements::<I>(program, vertex_array, indices, mode, first, count, Some(instances))
}

fn draw_elements<I: IndexType>(
    program: &Bound<Program, CurrentProgram>,
    vertex_array: &Bound<VertexArray, CurrentVertexArray>,
    indices: &Bound<Buffer, ElementArrayBuffer>,
    mode: Primitive,
    first: usize,
    count: i32,
    instances: Option<i32>,
) {
    if count <= 0 || !check_draw(program, vertex_array) {
        return;
    }
    if !check_initialized(ObjectKind::Buffer, indices.handle()) {
        return;
    }
    let offset = first * mem::size_of::<I>();
    debug_assert!(
        offset + count as usize * mem::size_of::<I>() <= indices.size(),
        "index range out of bounds of the index buffer"
    );
    trace!(?mode, format = ?I::FORMAT, offset, count, ?instances, "draw indexed");
    program
        .context()
        .backend()
        .draw_elements(mode, count, I::FORMAT, offset, instances);
}
