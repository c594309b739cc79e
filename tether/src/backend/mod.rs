//! Backend interface: the raw bind-then-operate entry points wrapped by this crate.
//!
//! Functions that act on "the object bound to target X" receive the target (or slot) they act
//! on; the crate guarantees that the right object is bound when they are called.
use crate::buffer::BufferUsage;
use crate::draw::{IndexFormat, Primitive};
use crate::format::PixelFormat;
use crate::framebuffer::{Attachment, ClearMask, ClearValues, FramebufferStatus, Rect};
use crate::handle::{Handle, ObjectKind};
use crate::sampling::{Filter, TextureParameter};
use crate::target::{Slot, TargetId};
use crate::texture::TexImage;
use crate::uniform::{BlockType, UniformValue};
use crate::vertex::AttribFormat;
use std::ops::Range;

#[cfg(feature = "gl")]
pub mod gl;
pub mod mock;

pub trait Backend {
    //--- objects -------------------------------------------------------------------------------

    /// Allocates a new object. Returns `Handle::NULL` on failure.
    fn generate(&self, kind: ObjectKind) -> Handle;
    fn delete(&self, kind: ObjectKind, handle: Handle);

    //--- binding state -------------------------------------------------------------------------

    /// Binds an object to a slot. Binding `Handle::NULL` unbinds.
    fn bind(&self, slot: Slot, handle: Handle);
    /// Queries the object bound to a slot.
    fn binding(&self, slot: Slot) -> Handle;
    /// Binds a buffer (or a range of it) to an indexed binding point of `target`.
    fn bind_buffer_range(&self, target: TargetId, index: u32, buffer: Handle, range: Option<Range<usize>>);
    /// Makes `unit` the active texture unit.
    fn active_texture(&self, unit: u32);

    //--- buffers -------------------------------------------------------------------------------

    /// (Re)allocates the storage of the buffer bound to `target`, optionally with initial contents.
    fn buffer_data(&self, target: TargetId, size: usize, data: Option<&[u8]>, usage: BufferUsage);
    fn buffer_sub_data(&self, target: TargetId, offset: usize, data: &[u8]);

    //--- textures & renderbuffers --------------------------------------------------------------

    /// Specifies an image of the texture bound to `slot`.
    fn tex_image(&self, slot: Slot, image: &TexImage);
    fn tex_parameter(&self, slot: Slot, param: TextureParameter);
    fn generate_mipmap(&self, slot: Slot);
    /// Allocates the storage of the bound renderbuffer.
    fn renderbuffer_storage(&self, format: PixelFormat, width: u32, height: u32, samples: u32);

    //--- framebuffers --------------------------------------------------------------------------

    fn framebuffer_texture(&self, target: TargetId, attachment: Attachment, texture: Handle, level: u32, layer: Option<u32>);
    fn framebuffer_renderbuffer(&self, target: TargetId, attachment: Attachment, renderbuffer: Handle);
    fn framebuffer_status(&self, target: TargetId) -> FramebufferStatus;
    /// Selects the color attachments written by fragment outputs of the draw framebuffer.
    fn draw_buffers(&self, attachments: &[Attachment]);
    /// Clears the draw framebuffer.
    fn clear(&self, values: &ClearValues);
    /// Copies a region of the read framebuffer to the draw framebuffer.
    fn blit_framebuffer(&self, src: Rect, dst: Rect, mask: ClearMask, filter: Filter);

    //--- programs ------------------------------------------------------------------------------

    /// Compiles a shader. Returns the compilation log on failure.
    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String>;
    /// Links a program from compiled shaders. Returns the link log on failure.
    fn link_program(&self, program: Handle, shaders: &[Handle]) -> Result<(), String>;
    fn uniform_location(&self, program: Handle, name: &str) -> Option<i32>;
    fn attribute_location(&self, program: Handle, name: &str) -> Option<u32>;
    fn block_index(&self, program: Handle, ty: BlockType, name: &str) -> Option<u32>;
    /// Assigns the binding point of an interface block.
    fn block_binding(&self, program: Handle, ty: BlockType, block: u32, binding: u32);
    /// Sets a uniform of the current program.
    fn uniform(&self, location: i32, value: UniformValue);

    //--- vertex arrays -------------------------------------------------------------------------

    /// Sources a vertex attribute of the bound vertex array from the bound array buffer.
    fn vertex_attrib_pointer(&self, index: u32, format: AttribFormat, stride: usize, offset: usize);
    fn enable_vertex_attrib(&self, index: u32, enabled: bool);
    fn vertex_attrib_divisor(&self, index: u32, divisor: u32);

    //--- draws ---------------------------------------------------------------------------------

    /// Non-indexed draw. `instances` is `None` for the non-instanced variant.
    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32, instances: Option<i32>);
    /// Indexed draw from the bound element array buffer. `offset` is in bytes.
    fn draw_elements(&self, mode: Primitive, count: i32, format: IndexFormat, offset: usize, instances: Option<i32>);
    /// Blocks until all submitted commands have completed.
    fn finish(&self);

    /// Forgets any state the backend caches on its side (e.g. the active texture unit).
    /// Called when code outside of this crate may have changed the state of the context.
    fn invalidate_state(&self) {}
}
