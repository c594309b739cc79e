//! Binding targets.
//!
//! Each binding slot of the context is represented by a zero-sized marker type implementing
//! [`Target`]. Which resources can be bound to which target is decided by the sealed
//! [`BindableTo`] trait, so an illegal combination is a compile error:
//!
//! ```compile_fail
//! use tether::{target, Bound, Buffer, Context, MockBackend};
//! let gl = Context::new(MockBackend::new());
//! let buffer = Buffer::new();
//! // buffers can't be bound to texture targets
//! let _bound = Bound::<_, target::Texture2D>::new(&gl, &buffer);
//! ```
//!
//! ```compile_fail
//! use tether::{target, Bound, Context, MockBackend, Texture2d};
//! let gl = Context::new(MockBackend::new());
//! let texture = Texture2d::new();
//! // a 2D texture can't be bound to the cube map target
//! let _bound = Bound::<_, target::TextureCubeMap>::new(&gl, &texture);
//! ```
//!
//! ```compile_fail
//! use tether::{target, Bind, Buffer, Context, MockBackend};
//! let gl = Context::new(MockBackend::new());
//! let buffer = Buffer::new();
//! let bound = buffer.bind::<target::ArrayBuffer>(&gl);
//! // only indexed targets accept ranged bindings
//! bound.bind_range(0, 0..16);
//! ```
use crate::handle::Resource;
use crate::sealed::Sealed;

/// Identifies a binding target at runtime.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetId {
    ArrayBuffer,
    ElementArrayBuffer,
    UniformBuffer,
    ShaderStorageBuffer,
    CopyReadBuffer,
    CopyWriteBuffer,
    PixelPackBuffer,
    PixelUnpackBuffer,
    DrawIndirectBuffer,
    DispatchIndirectBuffer,
    TextureBuffer,
    TransformFeedbackBuffer,
    AtomicCounterBuffer,
    QueryBuffer,
    Texture1D,
    Texture2D,
    Texture3D,
    Texture2DArray,
    TextureCubeMap,
    DrawFramebuffer,
    ReadFramebuffer,
    RenderbufferTarget,
    CurrentProgram,
    CurrentVertexArray,
}

/// The kind of object a target holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TargetClass {
    Buffer,
    Texture,
    Framebuffer,
    Renderbuffer,
    Program,
    VertexArray,
}

impl TargetId {
    pub fn class(self) -> TargetClass {
        use TargetId::*;
        match self {
            ArrayBuffer | ElementArrayBuffer | UniformBuffer | ShaderStorageBuffer | CopyReadBuffer
            | CopyWriteBuffer | PixelPackBuffer | PixelUnpackBuffer | DrawIndirectBuffer
            | DispatchIndirectBuffer | TextureBuffer | TransformFeedbackBuffer | AtomicCounterBuffer
            | QueryBuffer => TargetClass::Buffer,
            Texture1D | Texture2D | Texture3D | Texture2DArray | TextureCubeMap => TargetClass::Texture,
            DrawFramebuffer | ReadFramebuffer => TargetClass::Framebuffer,
            RenderbufferTarget => TargetClass::Renderbuffer,
            CurrentProgram => TargetClass::Program,
            CurrentVertexArray => TargetClass::VertexArray,
        }
    }
}

/// A binding slot: a target, and for texture targets, the texture unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Slot {
    pub target: TargetId,
    pub unit: u32,
}

impl Slot {
    pub fn new(target: TargetId) -> Slot {
        Slot { target, unit: 0 }
    }

    /// Slot of a texture target on the given texture unit.
    pub fn texture_unit(target: TargetId, unit: u32) -> Slot {
        debug_assert_eq!(target.class(), TargetClass::Texture);
        Slot { target, unit }
    }
}

/// Trait implemented by binding target markers.
pub trait Target: Sealed + 'static {
    const ID: TargetId;
}

/// Targets that hold buffer objects.
pub trait BufferTarget: Target {}

/// Buffer targets with indexed binding points, which accept whole-buffer and ranged bindings
/// (`bind_base`, `bind_range`).
pub trait IndexedTarget: BufferTarget {}

/// Targets that hold texture objects. A texture is created for exactly one texture target.
pub trait TextureTarget: Target {}

/// Texture targets whose images are one-dimensional.
pub trait Image1dTarget: TextureTarget {}

/// Texture targets whose images are two-dimensional.
pub trait Image2dTarget: TextureTarget {}

/// Texture targets whose images are three-dimensional (or arrays of 2D layers).
pub trait Image3dTarget: TextureTarget {}

/// Texture targets that can be attached to a framebuffer one layer at a time.
pub trait LayeredTarget: TextureTarget {}

/// Targets that hold framebuffer objects.
pub trait FramebufferTarget: Target {}

/// Marker trait for legal (resource, target) combinations.
///
/// Implemented only by this crate; see the module documentation.
pub trait BindableTo<T: Target>: Resource {}

macro_rules! targets {
    ($($(#[$m:meta])* $name:ident: $($tr:ident),*;)*) => {
        $(
            $(#[$m])*
            #[derive(Copy, Clone, Debug)]
            pub struct $name;
            impl Sealed for $name {}
            impl Target for $name {
                const ID: TargetId = TargetId::$name;
            }
            $(impl $tr for $name {})*
        )*
    };
}

targets! {
    /// Vertex attribute data.
    ArrayBuffer: BufferTarget;
    /// Index data. Part of the state of the bound vertex array.
    ElementArrayBuffer: BufferTarget;
    UniformBuffer: BufferTarget, IndexedTarget;
    ShaderStorageBuffer: BufferTarget, IndexedTarget;
    /// Source of buffer-to-buffer copies.
    CopyReadBuffer: BufferTarget;
    /// Destination of buffer-to-buffer copies.
    CopyWriteBuffer: BufferTarget;
    PixelPackBuffer: BufferTarget;
    PixelUnpackBuffer: BufferTarget;
    DrawIndirectBuffer: BufferTarget;
    DispatchIndirectBuffer: BufferTarget;
    TextureBuffer: BufferTarget;
    TransformFeedbackBuffer: BufferTarget, IndexedTarget;
    AtomicCounterBuffer: BufferTarget, IndexedTarget;
    QueryBuffer: BufferTarget;
    Texture1D: TextureTarget, Image1dTarget;
    Texture2D: TextureTarget, Image2dTarget;
    Texture3D: TextureTarget, Image3dTarget, LayeredTarget;
    Texture2DArray: TextureTarget, Image3dTarget, LayeredTarget;
    TextureCubeMap: TextureTarget, LayeredTarget;
    /// Destination of draws, clears and blits.
    DrawFramebuffer: FramebufferTarget;
    /// Source of reads and blits.
    ReadFramebuffer: FramebufferTarget;
    RenderbufferTarget: ;
    /// The program used by draw calls.
    CurrentProgram: ;
    /// The vertex array used by draw calls.
    CurrentVertexArray: ;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_classes() {
        assert_eq!(<ArrayBuffer as Target>::ID.class(), TargetClass::Buffer);
        assert_eq!(<QueryBuffer as Target>::ID.class(), TargetClass::Buffer);
        assert_eq!(<TextureCubeMap as Target>::ID.class(), TargetClass::Texture);
        assert_eq!(<ReadFramebuffer as Target>::ID.class(), TargetClass::Framebuffer);
        assert_eq!(<RenderbufferTarget as Target>::ID.class(), TargetClass::Renderbuffer);
        assert_eq!(<CurrentProgram as Target>::ID.class(), TargetClass::Program);
        assert_eq!(<CurrentVertexArray as Target>::ID.class(), TargetClass::VertexArray);
    }

    #[test]
    fn slots_on_different_units_are_distinct() {
        let a = Slot::texture_unit(TargetId::Texture2D, 0);
        let b = Slot::texture_unit(TargetId::Texture2D, 1);
        assert_ne!(a, b);
        assert_eq!(a, Slot::new(TargetId::Texture2D));
    }
}
